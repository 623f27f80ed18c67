//! Sustainable fishing workflows for the Coastline platform
//!
//! Three declarative workflows cover the fishing industry lifecycle:
//!
//! - [`create_fishing_permit_workflow`] — commercial permit
//!   application: citizen intake, identity/vessel/safety verification,
//!   quota allocation, fee payment, supervisor approval, issuance
//! - [`create_catch_reporting_workflow`] — daily catch reports with
//!   zone authorization and quota compliance
//! - [`create_traceability_workflow`] — catch-to-consumer linking with
//!   QR verification
//!
//! Each function returns a built, validated
//! [`Workflow`](workflow_types::Workflow) ready to register with the
//! engine. Registry lookups (licenses, vessels, quotas) go through the
//! seams in [`lookup`]; the default constructors wire the mock
//! maritime-authority implementations, and the `*_with` variants accept
//! real services.

#![deny(unsafe_code)]

pub mod catch_report;
pub mod lookup;
pub mod permit;
pub mod traceability;

pub use catch_report::{create_catch_reporting_workflow, create_catch_reporting_workflow_with};
pub use lookup::{
    IdentityRegistry, LicenseRecord, MockIdentityRegistry, MockQuotaLedger, MockVesselRegistry,
    QuotaLedger, Registries, VesselRecord, VesselRegistry,
};
pub use permit::{create_fishing_permit_workflow, create_fishing_permit_workflow_with};
pub use traceability::create_traceability_workflow;

use serde_json::Value;
use workflow_types::{Predicate, StepOutput, WorkflowInstance};

/// Read a citizen-submitted string, defaulting to empty when absent or
/// not a string
pub(crate) fn data_str<'a>(instance: &'a WorkflowInstance, key: &str) -> &'a str {
    instance.data.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Absent, null, or empty values count as not provided
pub(crate) fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        _ => false,
    }
}

/// Convert a `json!` object literal into a step output
pub(crate) fn output(value: Value) -> StepOutput {
    match value {
        Value::Object(map) => map,
        _ => StepOutput::new(),
    }
}

/// Guard matching a `status` value produced by the preceding check step
pub(crate) fn status_is(expected: &'static str) -> Predicate {
    Predicate::new(move |_, context| {
        context.get("status").and_then(Value::as_str) == Some(expected)
    })
}
