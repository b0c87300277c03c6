use serde::{Deserialize, Serialize};

/// What is covering the driver's face in the cabin frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OcclusionType {
    Sunglasses,
    Mask,
    Hand,
    Posture,
    None,
    /// Anything outside the set above, e.g. a cap brim
    #[serde(other)]
    Other,
}

/// Driver identity verdict, produced by the identity-verification analysis
/// and optionally attached to a violation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverIdentity {
    pub id_confirmed: bool,

    /// Match confidence (0.0 - 1.0)
    pub match_confidence: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identified_name: Option<String>,

    pub occlusion_detected: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occlusion_type: Option<OcclusionType>,

    /// How well the match held up despite occlusion (0.0 - 1.0)
    pub occlusion_resilience_score: f64,

    pub reasoning: String,
}
