//! The violation ledger
//!
//! An ordered, append-only collection of violation records. Each record's
//! `prev_hash` points at its predecessor's `ledger_hash`, and the whole
//! collection is persisted as one blob after every mutation.
//!
//! Removal (adjudication) drops a record without rehashing its neighbours, so
//! the link after a removed record no longer matches. `audit` reports those
//! broken links next to the per-record integrity verdicts.

use crate::seed;
use crate::storage::BlobStore;
use ananse_common::{
    Error, IntegrityStatus, NewViolation, Result, ViolationRecord, GENESIS_HASH,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Well-known key holding the ledger blob
pub const DEFAULT_LEDGER_KEY: &str = "ananse:ledger:v3";

/// Hex characters of UUID material in a violation id
const ID_HEX_LEN: usize = 12;

/// Integrity verdict for one record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAudit {
    pub id: String,
    pub position: usize,
    pub integrity_status: IntegrityStatus,
}

/// A `prev_hash` that does not match the preceding record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenLink {
    pub id: String,
    pub position: usize,
    pub expected_prev_hash: String,
    pub actual_prev_hash: String,
}

/// Chain-wide verification report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerAudit {
    pub total: usize,
    pub verified: usize,
    pub tampered: usize,
    pub unverified: usize,
    pub records: Vec<RecordAudit>,
    pub broken_links: Vec<BrokenLink>,
}

impl LedgerAudit {
    /// Every record verified and every link intact
    pub fn is_intact(&self) -> bool {
        self.verified == self.total && self.broken_links.is_empty()
    }
}

/// Ledger of violation records over a blob backend
pub struct LedgerStore {
    backend: Box<dyn BlobStore>,
    key: String,
    seed: bool,
    records: Option<Vec<ViolationRecord>>,
}

impl LedgerStore {
    /// Create an uninitialized store. Seeding on first use is enabled.
    pub fn new(backend: Box<dyn BlobStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            seed: true,
            records: None,
        }
    }

    /// Whether `initialize` writes the bootstrap records into an empty backend
    pub fn with_seed(mut self, seed: bool) -> Self {
        self.seed = seed;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_initialized(&self) -> bool {
        self.records.is_some()
    }

    /// Load the persisted ledger, or seed and persist it on first use.
    ///
    /// Calling again reloads the persisted state. An undecodable blob is a
    /// fatal error; nothing is salvaged from it.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.load_existing().await? {
            return Ok(());
        }

        let records = if self.seed {
            seed::bootstrap_records()?
        } else {
            Vec::new()
        };

        self.persist(&records).await?;

        info!(
            "Initialized ledger {} with {} bootstrap records",
            self.key,
            records.len()
        );
        self.records = Some(records);

        Ok(())
    }

    /// Load the persisted ledger without ever writing.
    ///
    /// Returns `false` and leaves the store uninitialized when nothing is
    /// persisted yet.
    pub async fn load_existing(&mut self) -> Result<bool> {
        match self.backend.load(&self.key).await? {
            Some(blob) => {
                let mut records: Vec<ViolationRecord> = serde_json::from_str(&blob)
                    .map_err(|e| Error::CorruptLedger(format!("{}: {}", self.key, e)))?;

                // The stored verdict is display only; derive it from content
                for record in &mut records {
                    record.integrity_status = record.verify();
                    if record.integrity_status != IntegrityStatus::Verified {
                        warn!("Violation {} loaded as {:?}", record.id, record.integrity_status);
                    }
                }

                info!("Loaded {} violation records from {}", records.len(), self.key);
                self.records = Some(records);
                Ok(true)
            }
            None => {
                self.records = None;
                Ok(false)
            }
        }
    }

    /// Records in insertion order. Empty before `initialize`.
    pub fn list(&self) -> &[ViolationRecord] {
        self.records.as_deref().unwrap_or(&[])
    }

    /// Look up a record by id
    pub fn get(&self, id: &str) -> Option<&ViolationRecord> {
        self.list().iter().find(|r| r.id == id)
    }

    /// Seal `content` onto the end of the chain and persist.
    ///
    /// On a persistence fault the in-memory ledger is left as it was.
    pub async fn append(&mut self, content: NewViolation) -> Result<ViolationRecord> {
        let current = self.records.as_ref().ok_or(Error::NotInitialized)?;

        let prev_hash = current
            .last()
            .map(|r| r.ledger_hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        let id = fresh_id(current);

        let record = ViolationRecord::seal(content, id, prev_hash)?;

        let mut next = current.clone();
        next.push(record.clone());
        self.persist(&next).await?;
        self.records = Some(next);

        info!(
            "Appended violation {} ({:?}) at position {}",
            record.id,
            record.kind,
            self.list().len() - 1
        );
        Ok(record)
    }

    /// Remove the record with `id` and persist.
    ///
    /// Returns `Ok(false)` without writing when no such record exists.
    pub async fn remove(&mut self, id: &str) -> Result<bool> {
        let current = self.records.as_ref().ok_or(Error::NotInitialized)?;

        if !current.iter().any(|r| r.id == id) {
            debug!("Violation not found for removal: {}", id);
            return Ok(false);
        }

        let next: Vec<ViolationRecord> = current.iter().filter(|r| r.id != id).cloned().collect();
        self.persist(&next).await?;
        self.records = Some(next);

        info!("Removed violation {}", id);
        Ok(true)
    }

    /// Recompute every record's hash and check every link
    pub fn audit(&self) -> LedgerAudit {
        let records = self.list();
        let mut report = LedgerAudit {
            total: records.len(),
            verified: 0,
            tampered: 0,
            unverified: 0,
            records: Vec::with_capacity(records.len()),
            broken_links: Vec::new(),
        };

        for (position, record) in records.iter().enumerate() {
            let integrity_status = record.verify();
            match integrity_status {
                IntegrityStatus::Verified => report.verified += 1,
                IntegrityStatus::Tampered => report.tampered += 1,
                IntegrityStatus::Unverified => report.unverified += 1,
            }

            let expected_prev_hash = match position {
                0 => GENESIS_HASH,
                _ => records[position - 1].ledger_hash.as_str(),
            };
            if record.prev_hash != expected_prev_hash {
                report.broken_links.push(BrokenLink {
                    id: record.id.clone(),
                    position,
                    expected_prev_hash: expected_prev_hash.to_string(),
                    actual_prev_hash: record.prev_hash.clone(),
                });
            }

            report.records.push(RecordAudit {
                id: record.id.clone(),
                position,
                integrity_status,
            });
        }

        if report.tampered > 0 {
            warn!("Ledger {} has {} tampered records", self.key, report.tampered);
        }

        report
    }

    /// Persist the final state and release the in-memory ledger.
    /// The store must be initialized again before further use.
    pub async fn teardown(&mut self) -> Result<()> {
        let records = self.records.take().ok_or(Error::NotInitialized)?;

        if let Err(e) = self.persist(&records).await {
            self.records = Some(records);
            return Err(e);
        }

        info!("Ledger {} torn down with {} records", self.key, records.len());
        Ok(())
    }

    /// Delete the persisted ledger and forget the in-memory copy.
    ///
    /// This is the upgrade path for blob format changes: there is no
    /// migration, the next `initialize` starts over.
    pub async fn reset(&mut self) -> Result<()> {
        self.backend.delete(&self.key).await?;
        self.records = None;
        warn!("Ledger {} reset", self.key);
        Ok(())
    }

    async fn persist(&self, records: &[ViolationRecord]) -> Result<()> {
        let blob = serde_json::to_string(records)?;
        self.backend.save(&self.key, &blob).await
    }
}

/// New violation id, distinct from every live id
fn fresh_id(records: &[ViolationRecord]) -> String {
    loop {
        let material = Uuid::new_v4().simple().to_string();
        let id = format!("V-{}", material[..ID_HEX_LEN].to_uppercase());
        if !records.iter().any(|r| r.id == id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlobStore;
    use ananse_common::{AdjudicationStatus, ViolationKind};
    use std::sync::Arc;

    async fn empty_store() -> (LedgerStore, Arc<MemoryBlobStore>) {
        let backend = Arc::new(MemoryBlobStore::new());
        let mut store =
            LedgerStore::new(Box::new(backend.clone()), DEFAULT_LEDGER_KEY).with_seed(false);
        store.initialize().await.unwrap();
        (store, backend)
    }

    #[tokio::test]
    async fn test_first_initialize_seeds_and_persists() {
        let backend = Arc::new(MemoryBlobStore::new());
        let mut store = LedgerStore::new(Box::new(backend.clone()), DEFAULT_LEDGER_KEY);
        store.initialize().await.unwrap();

        assert_eq!(store.list().len(), 2);
        assert_eq!(store.list()[0].id, "V-83921");

        let blob = backend.snapshot(DEFAULT_LEDGER_KEY).expect("blob persisted");
        let persisted: Vec<ViolationRecord> = serde_json::from_str(&blob).unwrap();
        assert_eq!(persisted, store.list());
        assert!(store.audit().is_intact());
    }

    #[tokio::test]
    async fn test_initialize_loads_existing_state_verbatim() {
        let (mut store, backend) = empty_store().await;
        store
            .append(NewViolation::new(ViolationKind::WrongWay, 300.0))
            .await
            .unwrap();

        let mut reopened = LedgerStore::new(Box::new(backend.clone()), DEFAULT_LEDGER_KEY);
        reopened.initialize().await.unwrap();
        assert_eq!(reopened.list(), store.list());

        // Second call is a reload only
        reopened.initialize().await.unwrap();
        assert_eq!(reopened.list(), store.list());
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_fatal() {
        let backend = MemoryBlobStore::with_blob(DEFAULT_LEDGER_KEY, "[{\"id\":");
        let mut store = LedgerStore::new(Box::new(backend), DEFAULT_LEDGER_KEY);

        let err = store.initialize().await.unwrap_err();
        assert!(matches!(err, Error::CorruptLedger(_)));
        assert!(!store.is_initialized());
    }

    #[tokio::test]
    async fn test_mutations_require_initialize() {
        let mut store = LedgerStore::new(Box::new(MemoryBlobStore::new()), DEFAULT_LEDGER_KEY);
        assert!(store.list().is_empty());

        let err = store
            .append(NewViolation::new(ViolationKind::Speeding, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotInitialized));
        assert!(matches!(store.remove("V-1").await, Err(Error::NotInitialized)));
    }

    #[tokio::test]
    async fn test_appends_form_a_chain() {
        let (mut store, _) = empty_store().await;

        let kinds = [
            ViolationKind::Speeding,
            ViolationKind::MobilePhone,
            ViolationKind::ClonedPlate,
            ViolationKind::SeatBelt,
            ViolationKind::MultiInfraction,
        ];
        for (i, kind) in kinds.into_iter().enumerate() {
            store
                .append(NewViolation::new(kind, 100.0 * i as f64))
                .await
                .unwrap();
        }

        let records = store.list();
        assert_eq!(records.len(), kinds.len());
        assert_eq!(records[0].prev_hash, GENESIS_HASH);
        for pair in records.windows(2) {
            assert_eq!(pair[1].prev_hash, pair[0].ledger_hash);
        }
        for record in records {
            assert_eq!(record.compute_hash().unwrap(), record.ledger_hash);
            assert_eq!(record.status, AdjudicationStatus::Pending);
        }
        assert!(store.audit().is_intact());
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let (mut store, _) = empty_store().await;
        for _ in 0..50 {
            store
                .append(NewViolation::new(ViolationKind::Speeding, 10.0))
                .await
                .unwrap();
        }

        let mut ids: Vec<&str> = store.list().iter().map(|r| r.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 50);
        assert!(ids.iter().all(|id| id.starts_with("V-") && id.len() == 2 + ID_HEX_LEN));
    }

    #[tokio::test]
    async fn test_invalid_record_is_rejected_without_write() {
        let (mut store, backend) = empty_store().await;
        let before = backend.snapshot(DEFAULT_LEDGER_KEY);

        let err = store
            .append(NewViolation::new(ViolationKind::Speeding, -5.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRecord(_)));
        assert!(store.list().is_empty());
        assert_eq!(backend.snapshot(DEFAULT_LEDGER_KEY), before);
    }

    #[tokio::test]
    async fn test_persistence_fault_leaves_memory_unchanged() {
        let (mut store, backend) = empty_store().await;
        backend.set_fail_writes(true);

        let err = store
            .append(NewViolation::new(ViolationKind::Speeding, 850.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
        assert!(store.list().is_empty());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent_noop_for_unknown_id() {
        let (mut store, _) = empty_store().await;
        store
            .append(NewViolation::new(ViolationKind::Speeding, 850.0))
            .await
            .unwrap();
        let before = store.list().to_vec();

        assert!(!store.remove("V-DOESNOTEXIST").await.unwrap());
        assert_eq!(store.list(), before.as_slice());
    }

    #[tokio::test]
    async fn test_remove_does_not_rehash_neighbours() {
        let (mut store, _) = empty_store().await;
        let mut ids = Vec::new();
        for kind in [ViolationKind::Speeding, ViolationKind::WrongWay, ViolationKind::SeatBelt] {
            ids.push(store.append(NewViolation::new(kind, 200.0)).await.unwrap().id);
        }
        let last_before = store.list()[2].clone();

        assert!(store.remove(&ids[1]).await.unwrap());
        assert!(store.get(&ids[1]).is_none());
        assert_eq!(store.list()[1], last_before);

        let audit = store.audit();
        assert_eq!(audit.verified, 2);
        assert_eq!(audit.broken_links.len(), 1);
        assert_eq!(audit.broken_links[0].id, ids[2]);
        assert!(!audit.is_intact());
    }

    #[tokio::test]
    async fn test_audit_flags_tampered_record() {
        let backend = Arc::new(MemoryBlobStore::new());
        let mut store =
            LedgerStore::new(Box::new(backend.clone()), DEFAULT_LEDGER_KEY).with_seed(false);
        store.initialize().await.unwrap();
        store
            .append(NewViolation::new(ViolationKind::Speeding, 850.0))
            .await
            .unwrap();

        // Rewrite the fine directly in the persisted blob
        let blob = backend.snapshot(DEFAULT_LEDGER_KEY).unwrap();
        let mut records: Vec<ViolationRecord> = serde_json::from_str(&blob).unwrap();
        records[0].fine_amount = 1.0;
        backend
            .save(DEFAULT_LEDGER_KEY, &serde_json::to_string(&records).unwrap())
            .await
            .unwrap();

        store.initialize().await.unwrap();
        let audit = store.audit();
        assert_eq!(audit.tampered, 1);
        assert_eq!(audit.records[0].integrity_status, IntegrityStatus::Tampered);

        // The stored VERIFIED flag is not trusted by the queue either
        assert_eq!(store.list()[0].integrity_status, IntegrityStatus::Tampered);
        let id = store.list()[0].id.clone();
        assert_eq!(store.get(&id).unwrap().integrity_status, IntegrityStatus::Tampered);
    }

    #[tokio::test]
    async fn test_arbitrary_floats_survive_reload() {
        let (mut store, _backend) = empty_store().await;

        // xorshift64 for reproducible, unfriendly doubles in [0, 1)
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 11) as f64 / (1u64 << 53) as f64
        };

        let mut confidences = vec![0.9856906946328695, 0.1 + 0.2];
        confidences.extend((0..200).map(|_| next()));

        for confidence in &confidences {
            let mut content = NewViolation::new(ViolationKind::MobilePhone, next() * 1000.0);
            content.confidence = *confidence;
            content.evidence.metadata.gaze_confidence = Some(next());
            content.evidence.metadata.chromatic_integrity = Some(next());
            store.append(content).await.unwrap();
        }

        store.initialize().await.unwrap();

        assert_eq!(store.list().len(), confidences.len());
        for (record, confidence) in store.list().iter().zip(&confidences) {
            assert_eq!(record.confidence.to_bits(), confidence.to_bits());
            assert_eq!(record.integrity_status, IntegrityStatus::Verified);
        }
        assert!(store.audit().is_intact());
    }

    #[tokio::test]
    async fn test_append_then_remove_roundtrip() {
        let (mut store, _) = empty_store().await;

        let content: NewViolation =
            serde_json::from_str(r#"{"type":"SPEEDING","fineAmount":850}"#).unwrap();
        let record = store.append(content).await.unwrap();

        assert_eq!(store.list().len(), 1);
        assert_eq!(store.list()[0].prev_hash, GENESIS_HASH);
        assert_eq!(store.list()[0].integrity_status, IntegrityStatus::Verified);

        assert!(store.remove(&record.id).await.unwrap());
        assert!(store.list().is_empty());
    }

    #[tokio::test]
    async fn test_load_existing_never_writes() {
        let backend = Arc::new(MemoryBlobStore::new());
        let mut store = LedgerStore::new(Box::new(backend.clone()), DEFAULT_LEDGER_KEY);

        assert!(!store.load_existing().await.unwrap());
        assert!(!store.is_initialized());
        assert!(backend.snapshot(DEFAULT_LEDGER_KEY).is_none());
    }

    #[tokio::test]
    async fn test_teardown_and_reset() {
        let (mut store, backend) = empty_store().await;
        store
            .append(NewViolation::new(ViolationKind::Speeding, 850.0))
            .await
            .unwrap();

        store.teardown().await.unwrap();
        assert!(!store.is_initialized());
        assert!(backend.snapshot(DEFAULT_LEDGER_KEY).is_some());
        assert!(matches!(store.teardown().await, Err(Error::NotInitialized)));

        store.initialize().await.unwrap();
        assert_eq!(store.list().len(), 1);

        store.reset().await.unwrap();
        assert!(!store.is_initialized());
        assert!(backend.snapshot(DEFAULT_LEDGER_KEY).is_none());
    }
}
