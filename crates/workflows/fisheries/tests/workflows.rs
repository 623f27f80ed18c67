//! End-to-end tests for the fisheries workflows
//!
//! Structural checks over the three built workflows, plus full engine
//! runs with canned integration responses covering the happy paths and
//! every routed business failure.

use fisheries_workflows::{
    create_catch_reporting_workflow, create_fishing_permit_workflow, create_traceability_workflow,
};
use serde_json::{json, Value};
use std::sync::Arc;
use workflow_engine::{StaticIntegrationClient, WorkflowEngine};
use workflow_types::{Context, InstanceState, StepId, Suspension, Workflow};

// ── Structural properties ────────────────────────────────────────────

fn all_workflows() -> Vec<Workflow> {
    vec![
        create_fishing_permit_workflow().unwrap(),
        create_catch_reporting_workflow().unwrap(),
        create_traceability_workflow().unwrap(),
    ]
}

#[test]
fn workflows_are_created_with_start_and_steps() {
    let permit = create_fishing_permit_workflow().unwrap();
    assert_eq!(permit.id.as_str(), "fishing_permit_v1");
    assert_eq!(permit.name, "Commercial Fishing Permit Application");
    assert!(permit.step_count() > 0);
    assert_eq!(
        permit.start_id(),
        &StepId::new("collect_initial_application_data")
    );

    let catch = create_catch_reporting_workflow().unwrap();
    assert_eq!(catch.id.as_str(), "catch_reporting_v1");
    assert_eq!(catch.name, "Daily Catch Reporting");
    assert!(catch.step_count() > 0);

    let trace = create_traceability_workflow().unwrap();
    assert_eq!(trace.id.as_str(), "traceability_v1");
    assert_eq!(trace.name, "Supply Chain Traceability");
    assert!(trace.step_count() > 0);
}

#[test]
fn all_workflows_validate() {
    for workflow in all_workflows() {
        assert!(
            workflow.validate().is_ok(),
            "workflow {} failed validation",
            workflow.id
        );
    }
}

#[test]
fn workflows_have_terminal_and_conditional_routing() {
    let permit = create_fishing_permit_workflow().unwrap();
    assert!(!permit.terminal_steps().is_empty());
    assert!(!permit.conditional_steps().is_empty());
}

#[test]
fn every_conditional_has_guards_and_a_fallback() {
    for workflow in all_workflows() {
        for step in workflow.conditional_steps() {
            let outgoing = workflow.outgoing(&step.id);
            assert!(
                outgoing.iter().any(|t| t.guard.is_predicated()),
                "conditional {} in {} has no predicate guard",
                step.id,
                workflow.id
            );
            assert!(
                outgoing.last().map(|t| t.guard.is_otherwise()).unwrap(),
                "conditional {} in {} lacks a trailing fallback",
                step.id,
                workflow.id
            );
        }
    }
}

#[test]
fn every_terminal_is_reachable_from_start() {
    for workflow in all_workflows() {
        let reachable = workflow.reachable_from(workflow.start_id());
        for terminal in workflow.terminal_steps() {
            assert!(
                reachable.contains(&terminal.id),
                "terminal {} unreachable in {}",
                terminal.id,
                workflow.id
            );
        }
    }
}

#[test]
fn building_twice_is_deterministic() {
    for (a, b) in all_workflows().into_iter().zip(all_workflows()) {
        let ids_a: Vec<_> = a.steps().map(|s| s.id.clone()).collect();
        let ids_b: Vec<_> = b.steps().map(|s| s.id.clone()).collect();
        assert_eq!(ids_a, ids_b);

        for id in &ids_a {
            let routes_a: Vec<_> = a
                .outgoing(id)
                .iter()
                .map(|t| (t.target.clone(), t.label.clone(), t.guard.is_otherwise()))
                .collect();
            let routes_b: Vec<_> = b
                .outgoing(id)
                .iter()
                .map(|t| (t.target.clone(), t.label.clone(), t.guard.is_otherwise()))
                .collect();
            assert_eq!(routes_a, routes_b, "routes differ for step {}", id);
        }
    }
}

// ── Engine scenarios ─────────────────────────────────────────────────

fn stub_client() -> StaticIntegrationClient {
    StaticIntegrationClient::new()
        .with_response(
            "payment_gateway",
            "/process",
            json!({"payment_status": "completed", "transaction_id": "tx-20260807-0001"}),
        )
        .with_response(
            "blockchain_service",
            "/record",
            json!({"ledger_entry": "0x5eed", "recorded": true}),
        )
        .with_response(
            "blockchain_service",
            "/record_catch",
            json!({"ledger_entry": "0xca7c4", "recorded": true}),
        )
        .with_response(
            "blockchain_service",
            "/record_traceability",
            json!({"ledger_entry": "0x7ace", "recorded": true}),
        )
}

fn engine_with(client: StaticIntegrationClient) -> WorkflowEngine {
    let mut engine = WorkflowEngine::new(Arc::new(client));
    engine
        .register(create_fishing_permit_workflow().unwrap())
        .unwrap();
    engine
        .register(create_catch_reporting_workflow().unwrap())
        .unwrap();
    engine
        .register(create_traceability_workflow().unwrap())
        .unwrap();
    engine
}

fn permit_application_data() -> Context {
    let mut data = Context::new();
    let entries = [
        // initial application
        ("fisher_name", json!("Maria Santos")),
        ("email", json!("maria.santos@example.com")),
        ("phone", json!("+15551234567")),
        ("commercial_license", json!("CF12345678")),
        ("license_document", json!("license.pdf")),
        // vessel information
        ("vessel_name", json!("Esperanza")),
        ("vessel_registration", json!("VR12345678")),
        ("vessel_type", json!("Fishing Trawler")),
        ("vessel_length", json!(24)),
        ("vessel_registration_document", json!("registration.pdf")),
        ("vessel_inspection_certificate", json!("inspection.pdf")),
        // safety equipment and zones
        (
            "safety_equipment",
            json!([
                "life_jackets",
                "emergency_beacon",
                "fire_extinguisher",
                "first_aid_kit",
                "radio_communication",
                "gps_system"
            ]),
        ),
        ("safety_equipment_photos", json!("equipment.jpg")),
        ("requested_zones", json!(["PROTECTED_A"])),
        ("permit_type", json!("sustainable")),
        ("target_species", json!("Tuna, salmon, and cod")),
        ("fishing_methods", json!("Longlining")),
        // supporting documents
        ("business_license", json!("business.pdf")),
        ("tax_id", json!("123456789")),
        ("fishing_experience", json!(12)),
        ("previous_violations", json!("None")),
        ("insurance_certificate", json!("insurance.pdf")),
    ];
    for (key, value) in entries {
        data.insert(key.to_string(), value);
    }
    data
}

#[test]
fn permit_issued_end_to_end() {
    let mut engine = engine_with(stub_client());
    let workflow_id = create_fishing_permit_workflow().unwrap().id;

    let instance_id = engine
        .start_instance_with_data(&workflow_id, permit_application_data())
        .unwrap();

    // everything up to the supervisor sign-off runs in one advance
    let instance = engine.instance(&instance_id).unwrap();
    assert!(instance.is_suspended());
    match instance.suspension.as_ref().unwrap() {
        Suspension::Approval { step, approvers } => {
            assert_eq!(step, &StepId::new("final_approval"));
            assert_eq!(approvers, &vec!["permit_supervisor".to_string()]);
        }
        other => panic!("expected approval suspension, got {:?}", other),
    }

    // quota and fee were computed along the way
    let context = &engine.instance(&instance_id).unwrap().context;
    assert_eq!(context.get("annual_quota_tons").unwrap(), &json!(1000.0));
    assert_eq!(
        context.get("zone_allocations").unwrap()["PROTECTED_A"],
        json!(300.0)
    );
    assert_eq!(context.get("payment_status").unwrap(), &json!("completed"));

    engine
        .resolve_approval(&instance_id, "permit_supervisor", true)
        .unwrap();

    let instance = engine.instance(&instance_id).unwrap();
    assert_eq!(instance.state, InstanceState::Completed);
    assert_eq!(instance.terminal_step, Some(StepId::new("permit_issued")));
    assert!(instance
        .context
        .get("permit_number")
        .and_then(Value::as_str)
        .unwrap()
        .starts_with("FP"));
    assert_eq!(instance.context.get("recorded").unwrap(), &json!(true));
}

#[test]
fn invalid_license_routes_to_identity_failed() {
    let mut engine = engine_with(stub_client());
    let workflow_id = create_fishing_permit_workflow().unwrap().id;

    let mut data = permit_application_data();
    data.insert("commercial_license".to_string(), json!("XX000"));

    let instance_id = engine
        .start_instance_with_data(&workflow_id, data)
        .unwrap();

    let instance = engine.instance(&instance_id).unwrap();
    assert_eq!(instance.state, InstanceState::Completed);
    assert_eq!(instance.terminal_step, Some(StepId::new("identity_failed")));
    assert_eq!(instance.context.get("status").unwrap(), &json!("invalid"));
}

#[test]
fn missing_safety_equipment_routes_to_safety_failed() {
    let mut engine = engine_with(stub_client());
    let workflow_id = create_fishing_permit_workflow().unwrap().id;

    let mut data = permit_application_data();
    data.insert(
        "safety_equipment".to_string(),
        json!(["life_jackets", "gps_system"]),
    );

    let instance_id = engine
        .start_instance_with_data(&workflow_id, data)
        .unwrap();

    let instance = engine.instance(&instance_id).unwrap();
    assert_eq!(instance.terminal_step, Some(StepId::new("safety_failed")));
}

#[test]
fn declined_payment_routes_to_payment_failed() {
    let client = stub_client().with_response(
        "payment_gateway",
        "/process",
        json!({"payment_status": "declined", "reason": "insufficient funds"}),
    );
    let mut engine = engine_with(client);
    let workflow_id = create_fishing_permit_workflow().unwrap().id;

    let instance_id = engine
        .start_instance_with_data(&workflow_id, permit_application_data())
        .unwrap();

    let instance = engine.instance(&instance_id).unwrap();
    assert_eq!(instance.state, InstanceState::Completed);
    assert_eq!(instance.terminal_step, Some(StepId::new("payment_failed")));
}

#[test]
fn rejected_approval_routes_to_permit_rejected() {
    let mut engine = engine_with(stub_client());
    let workflow_id = create_fishing_permit_workflow().unwrap().id;

    let instance_id = engine
        .start_instance_with_data(&workflow_id, permit_application_data())
        .unwrap();
    engine
        .resolve_approval(&instance_id, "permit_supervisor", false)
        .unwrap();

    let instance = engine.instance(&instance_id).unwrap();
    assert_eq!(instance.state, InstanceState::Completed);
    assert_eq!(instance.terminal_step, Some(StepId::new("permit_rejected")));
}

#[test]
fn permit_suspends_for_each_citizen_form_in_turn() {
    let mut engine = engine_with(stub_client());
    let workflow_id = create_fishing_permit_workflow().unwrap().id;

    let instance_id = engine.start_instance(&workflow_id).unwrap();
    let instance = engine.instance(&instance_id).unwrap();
    match instance.suspension.as_ref().unwrap() {
        Suspension::CitizenInput { step, form } => {
            assert_eq!(step, &StepId::new("collect_initial_application_data"));
            assert_eq!(form.title, "Commercial Fishing Permit Application");
        }
        other => panic!("expected citizen input suspension, got {:?}", other),
    }

    let mut first_form = Context::new();
    for (key, value) in [
        ("fisher_name", json!("Maria Santos")),
        ("email", json!("maria.santos@example.com")),
        ("phone", json!("+15551234567")),
        ("commercial_license", json!("CF12345678")),
        ("license_document", json!("license.pdf")),
    ] {
        first_form.insert(key.to_string(), value);
    }
    engine.submit_input(&instance_id, first_form).unwrap();

    // identity passed, now waiting on the vessel form
    let instance = engine.instance(&instance_id).unwrap();
    assert_eq!(
        instance.suspension.as_ref().unwrap().step(),
        &StepId::new("collect_vessel_information")
    );
    assert_eq!(instance.context.get("status").unwrap(), &json!("valid"));
}

fn catch_report_data(total_species: &[(&str, f64)], zone: &str) -> Context {
    let species: Vec<Value> = total_species
        .iter()
        .map(|(name, weight)| json!({"species": name, "weight_kg": weight}))
        .collect();

    let mut data = Context::new();
    for (key, value) in [
        ("vessel_id", json!("VR12345678")),
        ("catch_date", json!("2026-08-06")),
        ("fishing_zone", json!(zone)),
        ("species_caught", json!(species)),
        ("gps_coordinates", json!("40.7128, -74.0060")),
        ("catch_photos", json!("catch.jpg")),
        ("fishing_gear_used", json!("Longline")),
    ] {
        data.insert(key.to_string(), value);
    }
    data
}

#[test]
fn catch_reported_end_to_end() {
    let mut engine = engine_with(stub_client());
    let workflow_id = create_catch_reporting_workflow().unwrap().id;

    let instance_id = engine
        .start_instance_with_data(
            &workflow_id,
            catch_report_data(&[("Tuna", 150.0), ("Cod", 200.0)], "ZONE_A"),
        )
        .unwrap();

    let instance = engine.instance(&instance_id).unwrap();
    assert_eq!(instance.state, InstanceState::Completed);
    assert_eq!(instance.terminal_step, Some(StepId::new("catch_reported")));
    assert_eq!(instance.context.get("total_weight_kg").unwrap(), &json!(350.0));
    assert!(instance
        .context
        .get("catch_certificate_id")
        .and_then(Value::as_str)
        .unwrap()
        .starts_with("CATCH_"));
}

#[test]
fn catch_within_remaining_quota_is_compliant() {
    // 500 000 kg against 550 000 kg remaining (1000 t annual, 450 t used)
    let mut engine = engine_with(stub_client());
    let workflow_id = create_catch_reporting_workflow().unwrap().id;

    let instance_id = engine
        .start_instance_with_data(
            &workflow_id,
            catch_report_data(&[("Sardine", 500_000.0)], "ZONE_A"),
        )
        .unwrap();

    let instance = engine.instance(&instance_id).unwrap();
    assert_eq!(instance.terminal_step, Some(StepId::new("catch_reported")));
    assert_eq!(instance.context.get("used_quota_tons").unwrap(), &json!(950.0));
}

#[test]
fn oversized_catch_routes_to_quota_exceeded() {
    let mut engine = engine_with(stub_client());
    let workflow_id = create_catch_reporting_workflow().unwrap().id;

    let instance_id = engine
        .start_instance_with_data(
            &workflow_id,
            catch_report_data(&[("Sardine", 600_000.0)], "ZONE_A"),
        )
        .unwrap();

    let instance = engine.instance(&instance_id).unwrap();
    assert_eq!(instance.state, InstanceState::Completed);
    assert_eq!(instance.terminal_step, Some(StepId::new("quota_exceeded")));
}

#[test]
fn unpermitted_zone_routes_to_unauthorized_zone() {
    let mut engine = engine_with(stub_client());
    let workflow_id = create_catch_reporting_workflow().unwrap().id;

    let instance_id = engine
        .start_instance_with_data(
            &workflow_id,
            catch_report_data(&[("Tuna", 150.0)], "ZONE_C"),
        )
        .unwrap();

    let instance = engine.instance(&instance_id).unwrap();
    assert_eq!(
        instance.terminal_step,
        Some(StepId::new("unauthorized_zone"))
    );
}

#[test]
fn traceability_chain_completes() {
    let mut engine = engine_with(stub_client());
    let workflow_id = create_traceability_workflow().unwrap().id;

    let mut data = Context::new();
    for (key, value) in [
        ("catch_certificate_id", json!("CATCH_20260806_a1b2c3d4")),
        ("invoice_number", json!("INV-1001")),
        ("buyer_info", json!({"name": "Harbor Fish Market"})),
        ("vessel_name", json!("Esperanza")),
        ("fisher_name", json!("Maria Santos")),
        ("catch_date", json!("2026-08-06")),
        ("fishing_zone", json!("ZONE_A")),
    ] {
        data.insert(key.to_string(), value);
    }

    let instance_id = engine
        .start_instance_with_data(&workflow_id, data)
        .unwrap();

    let instance = engine.instance(&instance_id).unwrap();
    assert_eq!(instance.state, InstanceState::Completed);
    assert_eq!(
        instance.terminal_step,
        Some(StepId::new("traceability_complete"))
    );
    assert_eq!(
        instance.context.get("traceability_id").unwrap(),
        &json!("TRACE_INV-1001_CATCH_20")
    );
    assert_eq!(
        instance.context.get("consumer_certificate_id").unwrap(),
        &json!("TRACE_INV-1001_CATCH_20")
    );
}
