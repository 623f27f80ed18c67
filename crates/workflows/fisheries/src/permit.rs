//! Commercial fishing permit application workflow
//!
//! Citizen-facing intake (application, vessel, safety and zones,
//! supporting documents), identity and vessel verification against the
//! registers, safety inspection, quota allocation and fee calculation,
//! payment, supervisor approval, permit generation, and a public-ledger
//! record. Every negative check routes to its own terminal step.

use crate::lookup::{IdentityRegistry, Registries, VesselRegistry};
use crate::{data_str, output, status_is};
use chrono::{Datelike, Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use workflow_engine::WorkflowBuilder;
use workflow_types::{
    ActionFn, Context, FieldValidation, FormField, HttpMethod, InputForm, Predicate, Step,
    StepOutput, Workflow, WorkflowInstance, WorkflowResult,
};

/// Safety equipment every commercial vessel must carry
const REQUIRED_EQUIPMENT: [&str; 6] = [
    "life_jackets",
    "emergency_beacon",
    "fire_extinguisher",
    "first_aid_kit",
    "radio_communication",
    "gps_system",
];

// ── Business rules ───────────────────────────────────────────────────

/// Validate commercial fisher identity and license
pub fn validate_fisher_identity(
    identity: &dyn IdentityRegistry,
    instance: &WorkflowInstance,
    _context: &Context,
) -> StepOutput {
    let fisher_name = data_str(instance, "fisher_name");
    let license_number = data_str(instance, "commercial_license");

    if fisher_name.is_empty() || license_number.is_empty() {
        return output(json!({
            "status": "invalid",
            "reason": "Missing required information",
        }));
    }

    match identity.lookup_license(license_number) {
        Some(record) => output(json!({
            "status": "valid",
            "fisher_id": record.fisher_id,
            "license_type": record.license_type,
            "experience_years": record.experience_years,
        })),
        None => output(json!({
            "status": "invalid",
            "reason": "Invalid commercial fishing license",
        })),
    }
}

/// Verify vessel registration and seaworthiness
pub fn verify_vessel_registration(
    vessels: &dyn VesselRegistry,
    instance: &WorkflowInstance,
    _context: &Context,
) -> StepOutput {
    let vessel_name = data_str(instance, "vessel_name");
    let registration_number = data_str(instance, "vessel_registration");
    let vessel_type = data_str(instance, "vessel_type");

    if vessel_name.is_empty() || registration_number.is_empty() || vessel_type.is_empty() {
        return output(json!({
            "status": "incomplete",
            "reason": "Missing vessel information",
        }));
    }

    match vessels.lookup_vessel(registration_number) {
        Some(record) => output(json!({
            "status": "verified",
            "vessel_id": record.vessel_id,
            "capacity_tons": record.capacity_tons,
            "last_inspection": record.last_inspection.to_rfc3339(),
            "inspection_due": record.inspection_due.to_rfc3339(),
        })),
        None => output(json!({
            "status": "unverified",
            "reason": "Vessel not found in registry",
        })),
    }
}

/// Verify required safety equipment is present
pub fn check_safety_equipment(instance: &WorkflowInstance, _context: &Context) -> StepOutput {
    let equipment: Vec<&str> = instance
        .data
        .get("safety_equipment")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let missing: Vec<&str> = REQUIRED_EQUIPMENT
        .iter()
        .copied()
        .filter(|item| !equipment.contains(item))
        .collect();

    if missing.is_empty() {
        output(json!({
            "status": "compliant",
            "safety_score": 100.0,
            "inspection_passed": true,
        }))
    } else {
        output(json!({
            "status": "non_compliant",
            "missing_equipment": missing,
            "safety_score": equipment.len() as f64 / REQUIRED_EQUIPMENT.len() as f64 * 100.0,
        }))
    }
}

/// Calculate the annual fishing quota from vessel capacity, permit
/// type, and requested zones. Protected zones get a reduced share.
pub fn calculate_quota_allocation(instance: &WorkflowInstance, context: &Context) -> StepOutput {
    let vessel_capacity = context
        .get("capacity_tons")
        .and_then(Value::as_f64)
        .unwrap_or(50.0);
    let permit_type = data_str(instance, "permit_type");
    let requested_zones: Vec<&str> = instance
        .data
        .get("requested_zones")
        .and_then(Value::as_array)
        .map(|zones| zones.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let base_quota = vessel_capacity * 10.0;
    let multiplier = match permit_type {
        "specialized" => 1.5,
        "sustainable" => 2.0,
        _ => 1.0,
    };
    let final_quota = base_quota * multiplier;

    let mut zone_allocations = StepOutput::new();
    for zone in requested_zones {
        let share = if zone.starts_with("PROTECTED") { 0.3 } else { 0.7 };
        zone_allocations.insert(zone.to_string(), json!(final_quota * share));
    }

    output(json!({
        "annual_quota_tons": final_quota,
        "zone_allocations": zone_allocations,
        "species_restrictions": ["No endangered species", "Seasonal restrictions apply"],
    }))
}

/// Calculate the permit fee from quota and vessel size, with a
/// discount for sustainable operations
pub fn calculate_permit_fee(instance: &WorkflowInstance, context: &Context) -> StepOutput {
    let annual_quota = context
        .get("annual_quota_tons")
        .and_then(Value::as_f64)
        .unwrap_or(500.0);
    let vessel_capacity = context
        .get("capacity_tons")
        .and_then(Value::as_f64)
        .unwrap_or(50.0);
    let permit_type = data_str(instance, "permit_type");

    let base_fee = 100.0;
    let quota_fee = annual_quota * 2.0;
    let vessel_fee = vessel_capacity * 10.0;

    let multiplier = match permit_type {
        "specialized" => 1.2,
        "sustainable" => 0.8,
        _ => 1.0,
    };

    let subtotal = (base_fee + quota_fee + vessel_fee) * multiplier;
    let tax = subtotal * 0.15;
    let total_fee = subtotal + tax;

    output(json!({
        "base_fee": base_fee,
        "quota_fee": quota_fee,
        "vessel_fee": vessel_fee,
        "subtotal": subtotal,
        "tax": tax,
        "total_fee": total_fee,
        "currency": "USD",
    }))
}

/// Assemble the data for the permit document
pub fn generate_permit_data(instance: &WorkflowInstance, context: &Context) -> StepOutput {
    let now = Utc::now();
    output(json!({
        "permit_number": format!("FP{}{}", now.year(), instance.id.short().to_uppercase()),
        "fisher_name": instance.data.get("fisher_name"),
        "vessel_name": instance.data.get("vessel_name"),
        "permit_type": instance.data.get("permit_type"),
        "issue_date": now.to_rfc3339(),
        "expiry_date": (now + Duration::days(365)).to_rfc3339(),
        "annual_quota_tons": context.get("annual_quota_tons"),
        "zone_allocations": context.get("zone_allocations"),
        "terms_conditions": [
            "Must report catch within 24 hours of landing",
            "Subject to random inspections",
            "Must maintain electronic logbook",
            "GPS tracking required at all times",
        ],
    }))
}

// ── Predicates ───────────────────────────────────────────────────────

fn payment_completed() -> Predicate {
    Predicate::new(|_, context| context.get("payment_status") == Some(&json!("completed")))
}

fn final_approved() -> Predicate {
    Predicate::new(|_, context| {
        context
            .get("approved")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    })
}

// ── Citizen forms ────────────────────────────────────────────────────

fn initial_application_form() -> InputForm {
    InputForm::new(
        "Commercial Fishing Permit Application",
        "Please provide your basic information to start your fishing permit application.",
    )
    .with_field(
        FormField::text("fisher_name", "Full Name")
            .with_placeholder("Enter your full legal name")
            .with_validation(FieldValidation::new().with_length(2, 100))
            .with_help_text("Your full legal name as it appears on your ID"),
    )
    .with_field(
        FormField::email("email", "Email Address")
            .with_placeholder("your.email@example.com")
            .with_help_text("We'll use this to send you updates about your application"),
    )
    .with_field(
        FormField::phone("phone", "Phone Number")
            .with_placeholder("+1 (555) 123-4567")
            .with_validation(FieldValidation::new().with_pattern(r"^[+]?[1-9]\d{1,14}$"))
            .with_help_text("Include country code for international numbers"),
    )
    .with_field(
        FormField::text("commercial_license", "Commercial Fishing License Number")
            .with_placeholder("CF123456789")
            .with_validation(
                FieldValidation::new()
                    .with_pattern("^CF[0-9]{8,12}$")
                    .with_length(10, 14),
            )
            .with_help_text("Your commercial fishing license number (starts with CF)"),
    )
    .with_field(
        FormField::file("license_document", "Commercial License Document")
            .with_help_text("Upload a clear photo or scan of your commercial fishing license"),
    )
}

fn vessel_information_form() -> InputForm {
    InputForm::new(
        "Vessel Information",
        "Please provide detailed information about your fishing vessel.",
    )
    .with_field(
        FormField::text("vessel_name", "Vessel Name")
            .with_placeholder("Enter your vessel's name")
            .with_validation(FieldValidation::new().with_length(2, 50))
            .with_help_text("The official name of your fishing vessel"),
    )
    .with_field(
        FormField::text("vessel_registration", "Vessel Registration Number")
            .with_placeholder("VR123456789")
            .with_validation(
                FieldValidation::new()
                    .with_pattern("^VR[0-9]{8,12}$")
                    .with_length(10, 14),
            )
            .with_help_text("Your vessel registration number (starts with VR)"),
    )
    .with_field(
        FormField::select(
            "vessel_type",
            "Vessel Type",
            [
                "Fishing Trawler",
                "Longline Vessel",
                "Seine Net Boat",
                "Crab Boat",
                "Lobster Boat",
                "Multi-purpose Fishing Vessel",
                "Other",
            ],
        )
        .with_help_text("Select the type of fishing vessel you operate"),
    )
    .with_field(
        FormField::number("vessel_length", "Vessel Length (meters)")
            .with_validation(FieldValidation::new().with_range(3.0, 200.0))
            .with_help_text("Length of your vessel in meters"),
    )
    .with_field(
        FormField::file("vessel_registration_document", "Vessel Registration Certificate")
            .with_help_text("Upload your vessel registration certificate"),
    )
    .with_field(
        FormField::file(
            "vessel_inspection_certificate",
            "Latest Safety Inspection Certificate",
        )
        .with_help_text("Upload your most recent vessel safety inspection certificate"),
    )
}

fn safety_and_zones_form() -> InputForm {
    InputForm::new(
        "Safety Equipment & Fishing Zone Selection",
        "Please confirm your safety equipment and select your desired fishing zones.",
    )
    .with_field(
        FormField::select(
            "safety_equipment",
            "Available Safety Equipment",
            [
                "life_jackets",
                "emergency_beacon",
                "fire_extinguisher",
                "first_aid_kit",
                "radio_communication",
                "gps_system",
                "life_rafts",
                "flares",
                "emergency_food_water",
            ],
        )
        .with_help_text("Select all safety equipment available on your vessel"),
    )
    .with_field(
        FormField::file("safety_equipment_photos", "Safety Equipment Photos")
            .with_help_text("Upload photos showing your vessel's safety equipment"),
    )
    .with_field(
        FormField::select(
            "requested_zones",
            "Requested Fishing Zones",
            [
                "ZONE_A - Coastal Waters (0-12 nautical miles)",
                "ZONE_B - Continental Shelf (12-50 nautical miles)",
                "ZONE_C - Deep Sea (50+ nautical miles)",
                "SUSTAINABLE_1 - Protected Area 1 (Special Permit Required)",
                "SUSTAINABLE_2 - Protected Area 2 (Seasonal Access)",
                "INTERNATIONAL_1 - International Waters Zone 1",
            ],
        )
        .with_help_text("Select the fishing zones you want access to"),
    )
    .with_field(
        FormField::select("permit_type", "Permit Type", ["general", "specialized", "sustainable"])
            .with_help_text(
                "General: Standard fishing permit, Specialized: Specific species/methods, \
                 Sustainable: Eco-certified operations",
            ),
    )
    .with_field(
        FormField::textarea("target_species", "Target Fish Species")
            .with_placeholder("List the main species you plan to catch (e.g., tuna, salmon, cod, etc.)")
            .with_validation(FieldValidation::new().with_length(10, 500))
            .with_help_text("Describe the primary fish species you intend to target"),
    )
    .with_field(
        FormField::select(
            "fishing_methods",
            "Fishing Methods",
            [
                "Trawling",
                "Longlining",
                "Seine Netting",
                "Gillnetting",
                "Trap/Pot Fishing",
                "Handline/Rod Fishing",
                "Multiple Methods",
            ],
        )
        .with_help_text("Select your primary fishing method"),
    )
}

fn documents_form() -> InputForm {
    InputForm::new(
        "Additional Documentation Required",
        "Please provide the following additional documentation to complete your fishing permit application.",
    )
    .with_field(
        FormField::file("business_license", "Business License")
            .with_help_text("Upload your current business license (PDF, JPG, PNG)"),
    )
    .with_field(
        FormField::text("tax_id", "Tax ID Number")
            .with_placeholder("Enter your tax identification number")
            .with_validation(
                FieldValidation::new()
                    .with_pattern("^[0-9]{9,12}$")
                    .with_length(9, 12),
            )
            .with_help_text("Your 9-12 digit tax identification number"),
    )
    .with_field(
        FormField::number("fishing_experience", "Years of Commercial Fishing Experience")
            .with_validation(FieldValidation::new().with_range(0.0, 50.0))
            .with_help_text("Number of years you have been commercially fishing"),
    )
    .with_field(
        FormField::select(
            "previous_violations",
            "Previous Fishing Violations",
            ["None", "Minor violations (1-2)", "Major violations (3+)"],
        )
        .with_help_text("Select your fishing violation history"),
    )
    .with_field(
        FormField::file("insurance_certificate", "Marine Insurance Certificate")
            .with_help_text("Upload proof of marine insurance coverage"),
    )
    .with_field(
        FormField::textarea("additional_comments", "Additional Comments")
            .optional()
            .with_placeholder("Any additional information you'd like to provide...")
            .with_help_text("Optional: Provide any additional information about your application"),
    )
}

// ── Workflow ─────────────────────────────────────────────────────────

/// Create the fishing permit application workflow against the mock
/// maritime-authority registers
pub fn create_fishing_permit_workflow() -> WorkflowResult<Workflow> {
    create_fishing_permit_workflow_with(Registries::default())
}

/// Create the fishing permit application workflow against the given
/// lookup services
pub fn create_fishing_permit_workflow_with(registries: Registries) -> WorkflowResult<Workflow> {
    let mut builder = WorkflowBuilder::new(
        "fishing_permit_v1",
        "Commercial Fishing Permit Application",
        "Apply for commercial fishing permit with vessel verification and quota allocation",
    );

    // citizen intake
    builder.add_step(
        Step::citizen_input(
            "collect_initial_application_data",
            "Collect Initial Application Data",
            initial_application_form(),
        )
        .with_description("Collect basic fisher and vessel information from citizen"),
    )?;

    let identity = Arc::clone(&registries.identity);
    builder.add_step(
        Step::action(
            "validate_identity",
            "Validate Fisher Identity",
            ActionFn::new(move |instance, context| {
                validate_fisher_identity(identity.as_ref(), instance, context)
            }),
        )
        .with_description("Verify commercial fisher identity and license")
        .with_required_inputs(["fisher_name", "commercial_license", "email", "phone"]),
    )?;
    builder.add_step(
        Step::conditional("identity_check", "Identity Verification Check")
            .with_description("Check if identity verification passed"),
    )?;

    builder.add_step(
        Step::citizen_input(
            "collect_vessel_information",
            "Collect Vessel Information",
            vessel_information_form(),
        )
        .with_description("Collect detailed vessel information and documentation"),
    )?;

    let vessels = Arc::clone(&registries.vessels);
    builder.add_step(
        Step::action(
            "verify_vessel",
            "Verify Vessel Registration",
            ActionFn::new(move |instance, context| {
                verify_vessel_registration(vessels.as_ref(), instance, context)
            }),
        )
        .with_description("Verify vessel registration and seaworthiness")
        .with_required_inputs(["vessel_name", "vessel_registration", "vessel_type"]),
    )?;
    builder.add_step(
        Step::conditional("vessel_check", "Vessel Verification Check")
            .with_description("Check if vessel verification passed"),
    )?;

    builder.add_step(
        Step::citizen_input(
            "collect_safety_equipment_and_zones",
            "Safety Equipment & Fishing Zones",
            safety_and_zones_form(),
        )
        .with_description("Collect safety equipment inventory and requested fishing zones"),
    )?;
    builder.add_step(
        Step::action(
            "safety_inspection",
            "Safety Equipment Inspection",
            ActionFn::new(check_safety_equipment),
        )
        .with_description("Verify required safety equipment")
        .with_required_inputs(["safety_equipment"]),
    )?;
    builder.add_step(
        Step::conditional("safety_check", "Safety Compliance Check")
            .with_description("Check if safety requirements met"),
    )?;

    builder.add_step(
        Step::citizen_input(
            "collect_citizen_documents",
            "Collect Additional Documents",
            documents_form(),
        )
        .with_description("Collect additional documentation from citizen"),
    )?;

    // quota, fee, payment
    builder.add_step(
        Step::action(
            "calculate_quota",
            "Calculate Fishing Quota",
            ActionFn::new(calculate_quota_allocation),
        )
        .with_description("Calculate annual fishing quota allocation")
        .with_required_inputs(["requested_zones", "permit_type"]),
    )?;
    builder.add_step(
        Step::action(
            "calculate_fee",
            "Calculate Permit Fee",
            ActionFn::new(calculate_permit_fee),
        )
        .with_description("Calculate permit fee based on quota and vessel"),
    )?;
    builder.add_step(
        Step::integration(
            "process_payment",
            "Process Permit Payment",
            "payment_gateway",
            "/process",
            HttpMethod::Post,
        )
        .with_description("Process permit fee payment"),
    )?;
    builder.add_step(
        Step::conditional("payment_check", "Payment Verification")
            .with_description("Verify payment was successful"),
    )?;

    // approval and issuance
    builder.add_step(
        Step::approval("final_approval", "Final Permit Approval", ["permit_supervisor"])
            .with_description("Final approval by permit supervisor"),
    )?;
    builder.add_step(
        Step::conditional("approval_check", "Approval Decision")
            .with_description("Check final approval decision"),
    )?;
    builder.add_step(
        Step::action(
            "generate_permit_data",
            "Generate Permit Data",
            ActionFn::new(generate_permit_data),
        )
        .with_description("Prepare permit document data"),
    )?;
    builder.add_step(
        Step::integration(
            "blockchain_record",
            "Record on Blockchain",
            "blockchain_service",
            "/record",
            HttpMethod::Post,
        )
        .with_description("Record permit on blockchain for transparency"),
    )?;

    // terminals
    builder.add_step(
        Step::terminal("identity_failed", "Identity Verification Failed")
            .with_description("Commercial fishing license invalid"),
    )?;
    builder.add_step(
        Step::terminal("vessel_failed", "Vessel Verification Failed")
            .with_description("Vessel not registered or not seaworthy"),
    )?;
    builder.add_step(
        Step::terminal("safety_failed", "Safety Inspection Failed")
            .with_description("Required safety equipment missing"),
    )?;
    builder.add_step(
        Step::terminal("payment_failed", "Payment Failed")
            .with_description("Permit fee payment unsuccessful"),
    )?;
    builder.add_step(
        Step::terminal("permit_rejected", "Permit Rejected")
            .with_description("Fishing permit application rejected"),
    )?;
    builder.add_step(
        Step::terminal("permit_issued", "Permit Issued")
            .with_description("Fishing permit successfully issued"),
    )?;

    // wiring
    builder.connect("collect_initial_application_data", "validate_identity");
    builder.connect("validate_identity", "identity_check");
    builder.connect_when(
        "identity_check",
        "identity valid",
        status_is("valid"),
        "collect_vessel_information",
    );
    builder.connect_otherwise("identity_check", "identity_failed");

    builder.connect("collect_vessel_information", "verify_vessel");
    builder.connect("verify_vessel", "vessel_check");
    builder.connect_when(
        "vessel_check",
        "vessel verified",
        status_is("verified"),
        "collect_safety_equipment_and_zones",
    );
    builder.connect_otherwise("vessel_check", "vessel_failed");

    builder.connect("collect_safety_equipment_and_zones", "safety_inspection");
    builder.connect("safety_inspection", "safety_check");
    builder.connect_when(
        "safety_check",
        "safety compliant",
        status_is("compliant"),
        "collect_citizen_documents",
    );
    builder.connect_otherwise("safety_check", "safety_failed");

    builder.connect("collect_citizen_documents", "calculate_quota");
    builder.connect("calculate_quota", "calculate_fee");
    builder.connect("calculate_fee", "process_payment");
    builder.connect("process_payment", "payment_check");
    builder.connect_when(
        "payment_check",
        "payment completed",
        payment_completed(),
        "final_approval",
    );
    builder.connect_otherwise("payment_check", "payment_failed");

    builder.connect("final_approval", "approval_check");
    builder.connect_when(
        "approval_check",
        "approved",
        final_approved(),
        "generate_permit_data",
    );
    builder.connect_otherwise("approval_check", "permit_rejected");

    builder.connect("generate_permit_data", "blockchain_record");
    builder.connect("blockchain_record", "permit_issued");

    builder.set_start("collect_initial_application_data")?;
    builder.build()
}
