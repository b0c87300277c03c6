//! Response schemas declared to the provider
//!
//! These are the wire contract: changing a required field changes what the
//! provider is told to return.

use serde_json::{json, Map, Value};

fn typed(kind: &str) -> Value {
    json!({ "type": kind })
}

fn described(kind: &str, description: &str) -> Value {
    json!({ "type": kind, "description": description })
}

/// String restricted to `values`
fn one_of(values: &[&str]) -> Value {
    json!({
        "type": "STRING",
        "format": "enum",
        "enum": values,
    })
}

pub const ARTIFACT_LEVELS: &[&str] = &["CLEAN", "PARTIAL", "REMAINING_NOISE"];
pub const OCCLUSION_TYPES: &[&str] = &["SUNGLASSES", "MASK", "HAND", "POSTURE", "NONE"];
pub const GAZE_DIRECTIONS: &[&str] = &["ROAD", "LAP", "DEVICE", "PASSENGER", "OTHER"];

fn object(properties: Vec<(&str, Value)>, required: &[&str]) -> Value {
    let properties: Map<String, Value> = properties
        .into_iter()
        .map(|(name, schema)| (name.to_string(), schema))
        .collect();

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": required,
    })
}

/// Schema for the composite violation analysis
pub fn complex_violation_schema() -> Value {
    let restoration_quality = object(
        vec![
            (
                "plateReconstructionScore",
                described("NUMBER", "Plate reconstruction fidelity (0.0-1.0)"),
            ),
            (
                "biometricIntegrityScore",
                described("NUMBER", "Facial reconstruction fidelity (0.0-1.0)"),
            ),
            ("artifactNeutralizationLevel", one_of(ARTIFACT_LEVELS)),
        ],
        &["plateReconstructionScore", "biometricIntegrityScore", "artifactNeutralizationLevel"],
    );

    let environmental_factors = object(
        vec![
            ("lightingCondition", typed("STRING")),
            ("visibilityRating", described("NUMBER", "0.0 (blind) to 1.0 (clear)")),
            ("moistureInterference", typed("BOOLEAN")),
            ("chromaticIntegrity", typed("NUMBER")),
        ],
        &["lightingCondition", "visibilityRating", "chromaticIntegrity"],
    );

    let vehicle = object(
        vec![
            ("plate", typed("STRING")),
            ("make", typed("STRING")),
            ("model", typed("STRING")),
            ("color", typed("STRING")),
        ],
        &["plate", "make", "model", "color"],
    );

    let driver_identity = object(
        vec![
            ("idConfirmed", typed("BOOLEAN")),
            ("matchConfidence", typed("NUMBER")),
            ("occlusionDetected", typed("BOOLEAN")),
            ("reasoning", typed("STRING")),
        ],
        &["idConfirmed", "matchConfidence", "occlusionDetected", "reasoning"],
    );

    object(
        vec![
            ("violationType", typed("STRING")),
            ("confidenceScore", typed("NUMBER")),
            ("behavioralProfile", described("STRING", "STABLE, ERRATIC, or AGGRESSIVE")),
            ("reasoning", typed("STRING")),
            ("restorationQuality", restoration_quality),
            ("environmentalFactors", environmental_factors),
            ("vehicle", vehicle),
            ("driverIdentity", driver_identity),
            ("securitySignature", typed("STRING")),
        ],
        &[
            "violationType",
            "confidenceScore",
            "behavioralProfile",
            "reasoning",
            "restorationQuality",
            "environmentalFactors",
            "vehicle",
            "driverIdentity",
        ],
    )
}

/// Schema for identity verification
pub fn identity_schema() -> Value {
    object(
        vec![
            ("idConfirmed", typed("BOOLEAN")),
            ("matchConfidence", typed("NUMBER")),
            ("identifiedName", typed("STRING")),
            ("occlusionDetected", typed("BOOLEAN")),
            ("occlusionType", one_of(OCCLUSION_TYPES)),
            ("occlusionResilienceScore", described("NUMBER", "Scale 0.0 to 1.0")),
            ("reasoning", typed("STRING")),
        ],
        &[
            "idConfirmed",
            "matchConfidence",
            "occlusionDetected",
            "occlusionResilienceScore",
            "reasoning",
        ],
    )
}

/// Schema for cabin behavior and gaze analysis
pub fn behavior_schema() -> Value {
    let pose_estimation = object(
        vec![
            ("description", typed("STRING")),
            ("distractionLevel", described("NUMBER", "Scale 0.0 to 1.0")),
        ],
        &["description", "distractionLevel"],
    );

    object(
        vec![
            ("violationDetected", typed("BOOLEAN")),
            ("phoneDetected", typed("BOOLEAN")),
            (
                "holdingPose",
                described(
                    "STRING",
                    "HAND_TO_EAR, TEXTING_IN_LAP, DASHBOARD_MOUNT, or HAND_IN_VIEW",
                ),
            ),
            ("gazeDirection", one_of(GAZE_DIRECTIONS)),
            ("gazeConfidence", described("NUMBER", "Confidence in the gaze vector (0.0 to 1.0)")),
            ("confidenceScore", described("NUMBER", "Overall detection confidence (0.0 to 1.0)")),
            ("reasoning", typed("STRING")),
            ("poseEstimation", pose_estimation),
        ],
        &[
            "violationDetected",
            "phoneDetected",
            "holdingPose",
            "gazeDirection",
            "gazeConfidence",
            "confidenceScore",
            "reasoning",
            "poseEstimation",
        ],
    )
}
