//! Violation records as they live in the ledger

use crate::identity::DriverIdentity;
use crate::ledger_hash::{is_well_formed, LedgerHash};
use crate::{Error, Result};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Days between capture and the fine's due date when none is given
pub const DEFAULT_DUE_DAYS: u64 = 30;

/// Violation classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    Speeding,
    MobilePhone,
    SeatBelt,
    ClonedPlate,
    WrongWay,
    DistractedDriving,
    MultiInfraction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    #[default]
    Unpaid,
    Overdue,
    Processing,
}

/// Derived verdict from comparing the stored and recomputed ledger hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrityStatus {
    Verified,
    Tampered,
    Unverified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjudicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BehavioralProfile {
    Stable,
    Erratic,
    Aggressive,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDescriptor {
    pub plate: String,
    pub make: String,
    pub model: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavioral_profile: Option<BehavioralProfile>,
}

/// Violation-specific evidence attributes.
///
/// Sparse: each violation type fills only the keys it has.
/// - SPEEDING: `speed`, `limit`
/// - MOBILE_PHONE / DISTRACTED_DRIVING: `action`, `hand`, `gaze`,
///   `gaze_confidence`, `skeleton_mapped`
/// - CLONED_PLATE: `mismatch_detected`, `registered_make`,
///   `registered_model`, `registered_color`
/// - any type: `restoration_level`, `ai_reasoning`, `lighting_condition`,
///   `chromatic_integrity`, `security_signature`, `biometric_match_id`
///
/// Keys outside this list are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gaze: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gaze_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton_mapped: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mismatch_detected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restoration_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chromatic_integrity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biometric_match_id: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_url: Option<String>,
    #[serde(default)]
    pub metadata: EvidenceMetadata,
}

/// Content of a violation before it is sealed into the ledger.
///
/// Everything except the classification and the fine may be omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewViolation {
    /// Capture time; defaults to now
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub location: String,

    #[serde(rename = "type")]
    pub kind: ViolationKind,

    /// Detection confidence; operator-entered records default to 1.0
    #[serde(default = "full_confidence")]
    pub confidence: f64,

    #[serde(default)]
    pub payment_status: PaymentStatus,

    pub fine_amount: f64,

    /// Defaults to `DEFAULT_DUE_DAYS` after capture
    #[serde(default)]
    pub due_date: Option<NaiveDate>,

    #[serde(default)]
    pub vehicle: VehicleDescriptor,

    #[serde(default)]
    pub driver: Option<DriverIdentity>,

    #[serde(default)]
    pub evidence: Evidence,
}

fn full_confidence() -> f64 {
    1.0
}

impl NewViolation {
    /// Minimal violation with everything else defaulted
    pub fn new(kind: ViolationKind, fine_amount: f64) -> Self {
        Self {
            timestamp: None,
            location: String::new(),
            kind,
            confidence: full_confidence(),
            payment_status: PaymentStatus::default(),
            fine_amount,
            due_date: None,
            vehicle: VehicleDescriptor::default(),
            driver: None,
            evidence: Evidence::default(),
        }
    }

    /// Check value ranges before the record is sealed
    pub fn validate(&self) -> Result<()> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::InvalidRecord(format!(
                "confidence must be within [0, 1], got {}",
                self.confidence
            )));
        }

        if !self.fine_amount.is_finite() || self.fine_amount < 0.0 {
            return Err(Error::InvalidRecord(format!(
                "fineAmount must be a non-negative amount, got {}",
                self.fine_amount
            )));
        }

        Ok(())
    }
}

/// A sealed ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub location: String,
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub confidence: f64,
    pub payment_status: PaymentStatus,
    pub fine_amount: f64,
    pub due_date: NaiveDate,
    pub ledger_hash: String,
    pub prev_hash: String,
    /// Display copy of the last derived verdict; `verify` is authoritative
    pub integrity_status: IntegrityStatus,
    pub vehicle: VehicleDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverIdentity>,
    pub evidence: Evidence,
    pub status: AdjudicationStatus,
}

/// The hashed view of a record: every field except the hash itself and the
/// derived integrity verdict. Field order is part of the ledger format.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalContent<'a> {
    id: &'a str,
    timestamp: &'a DateTime<Utc>,
    location: &'a str,
    #[serde(rename = "type")]
    kind: ViolationKind,
    confidence: f64,
    payment_status: PaymentStatus,
    fine_amount: f64,
    due_date: &'a NaiveDate,
    prev_hash: &'a str,
    vehicle: &'a VehicleDescriptor,
    driver: &'a Option<DriverIdentity>,
    evidence: &'a Evidence,
    status: AdjudicationStatus,
}

impl ViolationRecord {
    /// Seal new content into a record linked to `prev_hash`
    pub fn seal(content: NewViolation, id: String, prev_hash: String) -> Result<Self> {
        content.validate()?;

        let timestamp = content.timestamp.unwrap_or_else(Utc::now);
        let due_date = match content.due_date {
            Some(date) => date,
            None => {
                let captured = timestamp.date_naive();
                captured
                    .checked_add_days(Days::new(DEFAULT_DUE_DAYS))
                    .unwrap_or(captured)
            }
        };

        let mut record = Self {
            id,
            timestamp,
            location: content.location,
            kind: content.kind,
            confidence: content.confidence,
            payment_status: content.payment_status,
            fine_amount: content.fine_amount,
            due_date,
            ledger_hash: String::new(),
            prev_hash,
            integrity_status: IntegrityStatus::Verified,
            vehicle: content.vehicle,
            driver: content.driver,
            evidence: content.evidence,
            status: AdjudicationStatus::Pending,
        };
        record.ledger_hash = record.compute_hash()?;

        Ok(record)
    }

    /// Canonical bytes fed into the ledger digest
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        let content = CanonicalContent {
            id: &self.id,
            timestamp: &self.timestamp,
            location: &self.location,
            kind: self.kind,
            confidence: self.confidence,
            payment_status: self.payment_status,
            fine_amount: self.fine_amount,
            due_date: &self.due_date,
            prev_hash: &self.prev_hash,
            vehicle: &self.vehicle,
            driver: &self.driver,
            evidence: &self.evidence,
            status: self.status,
        };

        Ok(serde_json::to_vec(&content)?)
    }

    /// Recompute the ledger hash from content and `prev_hash`
    pub fn compute_hash(&self) -> Result<String> {
        Ok(LedgerHash::digest(&self.canonical_bytes()?).to_hex())
    }

    /// Derive the integrity verdict for this single link
    pub fn verify(&self) -> IntegrityStatus {
        if !is_well_formed(&self.ledger_hash) {
            return IntegrityStatus::Unverified;
        }

        match self.compute_hash() {
            Ok(hash) if hash == self.ledger_hash => IntegrityStatus::Verified,
            Ok(_) => IntegrityStatus::Tampered,
            Err(_) => IntegrityStatus::Unverified,
        }
    }
}
