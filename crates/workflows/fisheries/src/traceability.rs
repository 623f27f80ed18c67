//! Supply-chain traceability workflow
//!
//! Links a catch certificate to a sales invoice, generates the
//! consumer-facing QR payload and certificate, and records the full
//! chain on the public ledger. The chain is linear; there is nothing
//! to route.

use chrono::Utc;
use serde_json::json;
use workflow_engine::WorkflowBuilder;
use workflow_types::{
    ActionFn, Context, HttpMethod, Step, StepOutput, Workflow, WorkflowInstance, WorkflowResult,
};

use crate::{data_str, is_blank, output};

// ── Business rules ───────────────────────────────────────────────────

/// Link a catch certificate to a sales transaction
pub fn link_catch_to_sale(instance: &WorkflowInstance, _context: &Context) -> StepOutput {
    let catch_certificate_id = data_str(instance, "catch_certificate_id");
    let invoice_number = data_str(instance, "invoice_number");
    let buyer_info = instance.data.get("buyer_info");

    if catch_certificate_id.is_empty() || invoice_number.is_empty() || is_blank(buyer_info) {
        return output(json!({
            "status": "incomplete",
            "reason": "Missing required information",
        }));
    }

    let cert_prefix = &catch_certificate_id[..8.min(catch_certificate_id.len())];
    output(json!({
        "status": "linked",
        "traceability_id": format!("TRACE_{}_{}", invoice_number, cert_prefix),
        "catch_certificate_id": catch_certificate_id,
        "invoice_number": invoice_number,
        "buyer_name": buyer_info.and_then(|b| b.get("name")),
        "sale_date": Utc::now().to_rfc3339(),
    }))
}

/// Generate the QR payload for consumer verification
pub fn generate_qr_code(instance: &WorkflowInstance, context: &Context) -> StepOutput {
    let traceability_id = context
        .get("traceability_id")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("");

    let qr_data = json!({
        "traceability_id": traceability_id,
        "catch_date": instance.data.get("catch_date"),
        "fishing_vessel": instance.data.get("vessel_name"),
        "fishing_zone": instance.data.get("fishing_zone"),
        "species": instance.data.get("species"),
        "verification_url": format!("/verify/{}", traceability_id),
    });

    output(json!({
        "qr_code_data": qr_data,
        "qr_code_url": format!("/qr/{}.png", traceability_id),
        "verification_url": format!("/verify/{}", traceability_id),
    }))
}

/// Create the certificate handed to the final consumer
pub fn create_consumer_certificate(instance: &WorkflowInstance, context: &Context) -> StepOutput {
    output(json!({
        "consumer_certificate_id": context.get("traceability_id"),
        "product_origin": {
            "vessel": instance.data.get("vessel_name"),
            "fisher": instance.data.get("fisher_name"),
            "catch_date": instance.data.get("catch_date"),
            "fishing_zone": instance.data.get("fishing_zone"),
        },
        "sustainability_score": 95,
        "certifications": ["Sustainable Fishing", "GPS Verified", "Blockchain Recorded"],
        "qr_code_url": context.get("qr_code_url"),
    }))
}

// ── Workflow ─────────────────────────────────────────────────────────

/// Create the traceability and invoice linking workflow
pub fn create_traceability_workflow() -> WorkflowResult<Workflow> {
    let mut builder = WorkflowBuilder::new(
        "traceability_v1",
        "Supply Chain Traceability",
        "Link catch data to sales for consumer transparency",
    );

    builder.add_step(
        Step::action(
            "link_catch_sale",
            "Link Catch to Sale",
            ActionFn::new(link_catch_to_sale),
        )
        .with_description("Connect catch certificate to sales invoice")
        .with_required_inputs(["catch_certificate_id", "invoice_number", "buyer_info"]),
    )?;
    builder.add_step(
        Step::action(
            "generate_qr_code",
            "Generate QR Code",
            ActionFn::new(generate_qr_code),
        )
        .with_description("Create QR code for consumer verification"),
    )?;
    builder.add_step(
        Step::action(
            "create_consumer_certificate",
            "Create Consumer Certificate",
            ActionFn::new(create_consumer_certificate),
        )
        .with_description("Generate final consumer traceability certificate"),
    )?;
    builder.add_step(
        Step::integration(
            "record_traceability",
            "Record Traceability Chain",
            "blockchain_service",
            "/record_traceability",
            HttpMethod::Post,
        )
        .with_description("Record full traceability chain on blockchain"),
    )?;
    builder.add_step(
        Step::terminal("traceability_complete", "Traceability Chain Complete")
            .with_description("Full traceability from catch to consumer established"),
    )?;

    builder.connect("link_catch_sale", "generate_qr_code");
    builder.connect("generate_qr_code", "create_consumer_certificate");
    builder.connect("create_consumer_certificate", "record_traceability");
    builder.connect("record_traceability", "traceability_complete");

    builder.set_start("link_catch_sale")?;
    builder.build()
}
