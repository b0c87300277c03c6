pub mod error;
pub mod identity;
pub mod ledger_hash;
pub mod violation;

pub use error::{Error, Result};
pub use identity::{DriverIdentity, OcclusionType};
pub use ledger_hash::{LedgerHash, GENESIS_HASH};
pub use violation::{
    AdjudicationStatus, BehavioralProfile, Evidence, EvidenceMetadata, IntegrityStatus,
    NewViolation, PaymentStatus, VehicleDescriptor, ViolationKind, ViolationRecord,
};
