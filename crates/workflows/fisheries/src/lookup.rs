//! External-lookup seams for the fisheries workflows
//!
//! The business rules consult three authorities: the commercial
//! fishing license register, the vessel register, and the quota
//! ledger. Each is a trait so a deployment can wire the real services;
//! the mock implementations here reproduce the maritime-authority test
//! fixtures (license numbers prefixed `CF`, vessel registrations
//! prefixed `VR`, a 1000 t annual quota with 450 t consumed).

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

// ── Identity ─────────────────────────────────────────────────────────

/// A commercial fishing license on file
#[derive(Clone, Debug, PartialEq)]
pub struct LicenseRecord {
    pub fisher_id: String,
    pub license_type: String,
    pub experience_years: u32,
}

/// Looks up commercial fishing licenses
pub trait IdentityRegistry: Send + Sync {
    /// Find a license by number; `None` when it is not on file
    fn lookup_license(&self, license_number: &str) -> Option<LicenseRecord>;
}

/// Mock license register: any number prefixed `CF` is on file
#[derive(Clone, Copy, Debug, Default)]
pub struct MockIdentityRegistry;

impl IdentityRegistry for MockIdentityRegistry {
    fn lookup_license(&self, license_number: &str) -> Option<LicenseRecord> {
        if license_number.starts_with("CF") {
            Some(LicenseRecord {
                fisher_id: format!("FISHER_{}", license_number),
                license_type: "commercial".to_string(),
                experience_years: 5,
            })
        } else {
            None
        }
    }
}

// ── Vessels ──────────────────────────────────────────────────────────

/// A registered vessel
#[derive(Clone, Debug, PartialEq)]
pub struct VesselRecord {
    pub vessel_id: String,
    pub capacity_tons: f64,
    pub last_inspection: DateTime<Utc>,
    pub inspection_due: DateTime<Utc>,
}

/// Looks up vessel registrations and seaworthiness
pub trait VesselRegistry: Send + Sync {
    /// Find a vessel by registration number; `None` when unregistered
    fn lookup_vessel(&self, registration_number: &str) -> Option<VesselRecord>;
}

/// Mock vessel register: any registration prefixed `VR` exists, with a
/// 50 t capacity and an inspection window around the current date
#[derive(Clone, Copy, Debug, Default)]
pub struct MockVesselRegistry;

impl VesselRegistry for MockVesselRegistry {
    fn lookup_vessel(&self, registration_number: &str) -> Option<VesselRecord> {
        if registration_number.starts_with("VR") {
            let now = Utc::now();
            Some(VesselRecord {
                vessel_id: format!("VESSEL_{}", registration_number),
                capacity_tons: 50.0,
                last_inspection: now - Duration::days(180),
                inspection_due: now + Duration::days(185),
            })
        } else {
            None
        }
    }
}

// ── Quotas ───────────────────────────────────────────────────────────

/// Tracks annual quota allocations and consumption per vessel
pub trait QuotaLedger: Send + Sync {
    /// The vessel's allocated annual quota, in tons
    fn annual_quota_tons(&self, vessel_id: &str) -> f64;
    /// Quota already consumed this year, in tons
    fn used_quota_tons(&self, vessel_id: &str) -> f64;
    /// Zones the vessel's permit covers
    fn permitted_zones(&self, vessel_id: &str) -> Vec<String>;
}

/// Mock quota ledger: 1000 t allocated, 450 t consumed, coastal and
/// first sustainable zones permitted
#[derive(Clone, Copy, Debug, Default)]
pub struct MockQuotaLedger;

impl QuotaLedger for MockQuotaLedger {
    fn annual_quota_tons(&self, _vessel_id: &str) -> f64 {
        1000.0
    }

    fn used_quota_tons(&self, _vessel_id: &str) -> f64 {
        450.0
    }

    fn permitted_zones(&self, _vessel_id: &str) -> Vec<String> {
        vec![
            "ZONE_A".to_string(),
            "ZONE_B".to_string(),
            "SUSTAINABLE_1".to_string(),
        ]
    }
}

// ── Bundle ───────────────────────────────────────────────────────────

/// The lookup services a workflow is built against
#[derive(Clone)]
pub struct Registries {
    pub identity: Arc<dyn IdentityRegistry>,
    pub vessels: Arc<dyn VesselRegistry>,
    pub quotas: Arc<dyn QuotaLedger>,
}

impl Default for Registries {
    fn default() -> Self {
        Self {
            identity: Arc::new(MockIdentityRegistry),
            vessels: Arc::new(MockVesselRegistry),
            quotas: Arc::new(MockQuotaLedger),
        }
    }
}
