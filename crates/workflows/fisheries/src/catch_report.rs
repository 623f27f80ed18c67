//! Daily catch reporting workflow
//!
//! Vessel operators report each day's catch within 24 hours of
//! landing. The report is validated, the fishing zone checked against
//! the permit, the catch weighed against the remaining quota, and a
//! catch certificate recorded on the public ledger. Quota and zone
//! violations are routed outcomes, not errors.

use crate::lookup::{QuotaLedger, Registries};
use crate::{data_str, is_blank, output, status_is};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use workflow_engine::WorkflowBuilder;
use workflow_types::{
    ActionFn, Context, FieldValidation, FormField, HttpMethod, InputForm, Step, StepOutput,
    Workflow, WorkflowInstance, WorkflowResult,
};

// ── Business rules ───────────────────────────────────────────────────

/// Validate daily catch report completeness and sum the reported weight
pub fn validate_catch_data(instance: &WorkflowInstance, _context: &Context) -> StepOutput {
    let required_fields = ["vessel_id", "catch_date", "fishing_zone", "species_caught"];
    let missing_fields: Vec<&str> = required_fields
        .iter()
        .copied()
        .filter(|field| is_blank(instance.data.get(*field)))
        .collect();

    if !missing_fields.is_empty() {
        return output(json!({
            "status": "invalid",
            "missing_fields": missing_fields,
        }));
    }

    let species_list = instance
        .data
        .get("species_caught")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let total_weight: f64 = species_list
        .iter()
        .filter_map(|species| species.get("weight_kg").and_then(Value::as_f64))
        .sum();

    output(json!({
        "status": "valid",
        "total_weight_kg": total_weight,
        "species_count": species_list.len(),
        "validated_at": Utc::now().to_rfc3339(),
    }))
}

/// Verify fishing was done in a zone the permit covers
pub fn verify_fishing_zone(
    quotas: &dyn QuotaLedger,
    instance: &WorkflowInstance,
    _context: &Context,
) -> StepOutput {
    let fishing_zone = data_str(instance, "fishing_zone");
    let vessel_id = data_str(instance, "vessel_id");
    let permitted_zones = quotas.permitted_zones(vessel_id);

    if !permitted_zones.iter().any(|zone| zone == fishing_zone) {
        return output(json!({
            "status": "unauthorized_zone",
            "fishing_zone": fishing_zone,
            "permitted_zones": permitted_zones,
        }));
    }

    let has_coordinates = !is_blank(instance.data.get("gps_coordinates"));
    output(json!({
        "status": "authorized",
        "fishing_zone": fishing_zone,
        "coordinates_verified": has_coordinates,
    }))
}

/// Check the reported catch against the vessel's remaining quota
pub fn check_quota_compliance(
    quotas: &dyn QuotaLedger,
    instance: &WorkflowInstance,
    context: &Context,
) -> StepOutput {
    let vessel_id = data_str(instance, "vessel_id");
    let total_weight = context
        .get("total_weight_kg")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    let annual_quota = quotas.annual_quota_tons(vessel_id);
    let used_quota = quotas.used_quota_tons(vessel_id);
    let remaining_quota = annual_quota - used_quota;

    if total_weight > remaining_quota * 1000.0 {
        return output(json!({
            "status": "quota_exceeded",
            "annual_quota_tons": annual_quota,
            "used_quota_tons": used_quota,
            "remaining_quota_kg": remaining_quota * 1000.0,
            "catch_weight_kg": total_weight,
        }));
    }

    output(json!({
        "status": "compliant",
        "annual_quota_tons": annual_quota,
        "used_quota_tons": used_quota + total_weight / 1000.0,
        "remaining_quota_kg": remaining_quota * 1000.0 - total_weight,
    }))
}

/// Generate the catch certificate with its ledger hash
pub fn generate_catch_certificate(instance: &WorkflowInstance, context: &Context) -> StepOutput {
    let catch_id = format!(
        "CATCH_{}_{}",
        Utc::now().format("%Y%m%d"),
        instance.id.short()
    );

    output(json!({
        "catch_certificate_id": catch_id,
        "vessel_id": instance.data.get("vessel_id"),
        "catch_date": instance.data.get("catch_date"),
        "total_weight_kg": context.get("total_weight_kg"),
        "fishing_zone": instance.data.get("fishing_zone"),
        "blockchain_hash": format!("0x{}", instance.id),
        "certificate_url": format!("/certificates/{}", catch_id),
    }))
}

// ── Citizen form ─────────────────────────────────────────────────────

fn daily_catch_form() -> InputForm {
    InputForm::new(
        "Daily Catch Report",
        "Please submit your daily catch report within 24 hours of landing.",
    )
    .with_field(
        FormField::text("vessel_id", "Vessel ID")
            .with_placeholder("Enter your vessel registration ID")
            .with_validation(
                FieldValidation::new()
                    .with_pattern("^VR[0-9]{8,12}$")
                    .with_length(10, 14),
            )
            .with_help_text("Your vessel registration ID (starts with VR)"),
    )
    .with_field(
        FormField::date("catch_date", "Catch Date")
            .with_help_text("Date when the fish were caught"),
    )
    .with_field(
        FormField::select(
            "fishing_zone",
            "Fishing Zone",
            [
                "ZONE_A",
                "ZONE_B",
                "ZONE_C",
                "SUSTAINABLE_1",
                "SUSTAINABLE_2",
                "INTERNATIONAL_1",
            ],
        )
        .with_help_text("Zone where fishing activity took place"),
    )
    .with_field(
        FormField::textarea("species_caught", "Species and Quantities Caught")
            .with_placeholder("List species and weights, e.g.:\nTuna: 150kg\nSalmon: 75kg\nCod: 200kg")
            .with_validation(FieldValidation::new().with_length(10, 1000))
            .with_help_text("List all species caught with their weights in kilograms"),
    )
    .with_field(
        FormField::text("gps_coordinates", "GPS Coordinates")
            .with_placeholder("Latitude, Longitude (e.g., 40.7128, -74.0060)")
            .with_validation(
                FieldValidation::new().with_pattern(r"^-?\d{1,3}\.\d+,\s*-?\d{1,3}\.\d+$"),
            )
            .with_help_text("GPS coordinates where fishing took place"),
    )
    .with_field(
        FormField::file("catch_photos", "Catch Documentation Photos")
            .with_help_text("Upload photos of your catch for verification"),
    )
    .with_field(
        FormField::select(
            "fishing_gear_used",
            "Fishing Gear Used",
            [
                "Trawl Net",
                "Longline",
                "Seine Net",
                "Gillnet",
                "Fishing Rod",
                "Trap/Pot",
                "Multiple Gear Types",
            ],
        )
        .with_help_text("Primary fishing gear used for this catch"),
    )
    .with_field(
        FormField::select(
            "weather_conditions",
            "Weather Conditions",
            [
                "Clear/Calm",
                "Partly Cloudy",
                "Overcast",
                "Light Rain",
                "Heavy Rain",
                "Windy",
                "Storm Conditions",
            ],
        )
        .optional()
        .with_help_text("Weather conditions during fishing (optional)"),
    )
}

// ── Workflow ─────────────────────────────────────────────────────────

/// Create the daily catch reporting workflow against the mock quota
/// ledger
pub fn create_catch_reporting_workflow() -> WorkflowResult<Workflow> {
    create_catch_reporting_workflow_with(Registries::default())
}

/// Create the daily catch reporting workflow against the given lookup
/// services
pub fn create_catch_reporting_workflow_with(registries: Registries) -> WorkflowResult<Workflow> {
    let mut builder = WorkflowBuilder::new(
        "catch_reporting_v1",
        "Daily Catch Reporting",
        "Report daily catch with quota tracking and zone verification",
    );

    builder.add_step(
        Step::citizen_input(
            "collect_daily_catch_data",
            "Daily Catch Report Submission",
            daily_catch_form(),
        )
        .with_description("Collect daily catch report from fishing vessel operator"),
    )?;

    builder.add_step(
        Step::action(
            "validate_catch_data",
            "Validate Catch Data",
            ActionFn::new(validate_catch_data),
        )
        .with_description("Validate catch report completeness and format")
        .with_required_inputs(["vessel_id", "catch_date", "fishing_zone", "species_caught"]),
    )?;
    builder.add_step(
        Step::conditional("data_validation_check", "Data Validation Check")
            .with_description("Check if catch data is valid"),
    )?;

    let zone_quotas = Arc::clone(&registries.quotas);
    builder.add_step(
        Step::action(
            "verify_zone",
            "Verify Fishing Zone",
            ActionFn::new(move |instance, context| {
                verify_fishing_zone(zone_quotas.as_ref(), instance, context)
            }),
        )
        .with_description("Verify fishing was done in permitted zones"),
    )?;
    builder.add_step(
        Step::conditional("zone_check", "Zone Authorization Check")
            .with_description("Check if fishing zone is authorized"),
    )?;

    let compliance_quotas = Arc::clone(&registries.quotas);
    builder.add_step(
        Step::action(
            "check_quota",
            "Check Quota Compliance",
            ActionFn::new(move |instance, context| {
                check_quota_compliance(compliance_quotas.as_ref(), instance, context)
            }),
        )
        .with_description("Verify catch is within quota limits"),
    )?;
    builder.add_step(
        Step::conditional("quota_compliance_check", "Quota Compliance Check")
            .with_description("Check if catch complies with quotas"),
    )?;

    builder.add_step(
        Step::action(
            "generate_certificate",
            "Generate Catch Certificate",
            ActionFn::new(generate_catch_certificate),
        )
        .with_description("Create catch certificate with blockchain record"),
    )?;
    builder.add_step(
        Step::integration(
            "record_blockchain",
            "Record on Blockchain",
            "blockchain_service",
            "/record_catch",
            HttpMethod::Post,
        )
        .with_description("Record catch data on blockchain"),
    )?;

    builder.add_step(
        Step::terminal("invalid_data", "Invalid Catch Data")
            .with_description("Catch report data is incomplete or invalid"),
    )?;
    builder.add_step(
        Step::terminal("unauthorized_zone", "Unauthorized Fishing Zone")
            .with_description("Fishing conducted in unauthorized zone"),
    )?;
    builder.add_step(
        Step::terminal("quota_exceeded", "Quota Exceeded")
            .with_description("Catch exceeds allocated quota limits"),
    )?;
    builder.add_step(
        Step::terminal("catch_reported", "Catch Successfully Reported")
            .with_description("Catch report submitted and verified"),
    )?;

    builder.connect("collect_daily_catch_data", "validate_catch_data");
    builder.connect("validate_catch_data", "data_validation_check");
    builder.connect_when(
        "data_validation_check",
        "catch data valid",
        status_is("valid"),
        "verify_zone",
    );
    builder.connect_otherwise("data_validation_check", "invalid_data");

    builder.connect("verify_zone", "zone_check");
    builder.connect_when(
        "zone_check",
        "zone authorized",
        status_is("authorized"),
        "check_quota",
    );
    builder.connect_otherwise("zone_check", "unauthorized_zone");

    builder.connect("check_quota", "quota_compliance_check");
    builder.connect_when(
        "quota_compliance_check",
        "quota compliant",
        status_is("compliant"),
        "generate_certificate",
    );
    builder.connect_otherwise("quota_compliance_check", "quota_exceeded");

    builder.connect("generate_certificate", "record_blockchain");
    builder.connect("record_blockchain", "catch_reported");

    builder.set_start("collect_daily_catch_data")?;
    builder.build()
}
