//! Bootstrap records written on first start

use ananse_common::{
    BehavioralProfile, Error, Evidence, EvidenceMetadata, NewViolation, PaymentStatus, Result,
    VehicleDescriptor, ViolationKind, ViolationRecord, GENESIS_HASH,
};
use chrono::{DateTime, NaiveDate, Utc};

fn instant(rfc3339: &str) -> Result<DateTime<Utc>> {
    rfc3339
        .parse()
        .map_err(|e| Error::InvalidRecord(format!("bad seed timestamp {}: {}", rfc3339, e)))
}

fn date(ymd: &str) -> Result<NaiveDate> {
    ymd.parse()
        .map_err(|e| Error::InvalidRecord(format!("bad seed date {}: {}", ymd, e)))
}

fn vehicle(
    plate: &str,
    make: &str,
    model: &str,
    color: &str,
    profile: BehavioralProfile,
) -> VehicleDescriptor {
    VehicleDescriptor {
        plate: plate.to_string(),
        make: make.to_string(),
        model: model.to_string(),
        color: color.to_string(),
        behavioral_profile: Some(profile),
    }
}

fn seed_content() -> Result<Vec<(&'static str, NewViolation)>> {
    let speeding = NewViolation {
        timestamp: Some(instant("2024-05-20T14:22:05Z")?),
        location: "Accra-Tema Motorway, Gate A".to_string(),
        kind: ViolationKind::Speeding,
        confidence: 0.98,
        payment_status: PaymentStatus::Unpaid,
        fine_amount: 850.0,
        due_date: Some(date("2024-06-20")?),
        vehicle: vehicle("GR-2849-24", "Honda", "Civic", "Silver", BehavioralProfile::Aggressive),
        driver: None,
        evidence: Evidence {
            image_url: "https://picsum.photos/seed/v1/1280/720".to_string(),
            processed_url: None,
            metadata: EvidenceMetadata {
                speed: Some(124.0),
                limit: Some(100.0),
                ai_reasoning: Some("Sustained speed 24% above the posted limit.".to_string()),
                security_signature: Some("QS-ANANSE-9912".to_string()),
                ..Default::default()
            },
        },
    };

    let phone = NewViolation {
        timestamp: Some(instant("2024-05-20T14:18:12Z")?),
        location: "N1 Highway - Lapaz".to_string(),
        kind: ViolationKind::MobilePhone,
        confidence: 0.92,
        payment_status: PaymentStatus::Paid,
        fine_amount: 500.0,
        due_date: Some(date("2024-05-30")?),
        vehicle: vehicle("GW-503-23", "Toyota", "Hiace", "White", BehavioralProfile::Stable),
        driver: None,
        evidence: Evidence {
            image_url: "https://picsum.photos/seed/v2/1280/720".to_string(),
            processed_url: None,
            metadata: EvidenceMetadata {
                action: Some("HAND_TO_EAR".to_string()),
                ai_reasoning: Some(
                    "Handset held to the ear while the vehicle was moving.".to_string(),
                ),
                security_signature: Some("QS-ANANSE-9913".to_string()),
                ..Default::default()
            },
        },
    };

    Ok(vec![("V-83921", speeding), ("V-83922", phone)])
}

/// Seed records, chained from genesis exactly as `append` would chain them
pub fn bootstrap_records() -> Result<Vec<ViolationRecord>> {
    let mut records: Vec<ViolationRecord> = Vec::new();

    for (id, content) in seed_content()? {
        let prev_hash = records
            .last()
            .map(|r| r.ledger_hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        records.push(ViolationRecord::seal(content, id.to_string(), prev_hash)?);
    }

    Ok(records)
}
