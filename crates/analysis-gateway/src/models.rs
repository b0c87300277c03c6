//! Typed analysis results and media payloads

use ananse_common::{Error, Result, ViolationKind};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

pub use ananse_common::{DriverIdentity, OcclusionType};

/// Image or video sent inline to the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttachment {
    pub mime_type: String,

    /// Base64-encoded bytes
    pub data: String,
}

impl MediaAttachment {
    /// Wrap already-encoded media, checking the MIME type and the encoding
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Result<Self> {
        let mime_type = mime_type.into();
        let data = data.into();

        if !(mime_type.starts_with("image/") || mime_type.starts_with("video/")) {
            return Err(Error::InvalidRequest(format!(
                "unsupported media type: {}",
                mime_type
            )));
        }

        if data.is_empty() {
            return Err(Error::InvalidRequest("media payload is empty".to_string()));
        }

        STANDARD
            .decode(data.as_bytes())
            .map_err(|e| Error::InvalidRequest(format!("media payload is not base64: {}", e)))?;

        Ok(Self { mime_type, data })
    }

    /// Encode raw media bytes
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        Self::new(mime_type, STANDARD.encode(bytes))
    }

    /// `data:` URL for display
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// How much visual noise survived restoration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactLevel {
    Clean,
    Partial,
    RemainingNoise,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorationQuality {
    /// Plate reconstruction fidelity (0.0 - 1.0)
    pub plate_reconstruction_score: f64,

    /// Facial feature reconstruction fidelity (0.0 - 1.0)
    pub biometric_integrity_score: f64,

    pub artifact_neutralization_level: ArtifactLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalFactors {
    pub lighting_condition: String,

    /// 0.0 (blind) to 1.0 (clear)
    pub visibility_rating: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moisture_interference: Option<bool>,

    pub chromatic_integrity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleFinding {
    pub plate: String,
    pub make: String,
    pub model: String,
    pub color: String,
}

/// Identity summary embedded in the composite analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySummary {
    pub id_confirmed: bool,
    pub match_confidence: f64,
    pub occlusion_detected: bool,
    pub reasoning: String,
}

/// Result of the composite violation analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexViolationAnalysis {
    pub violation_type: String,
    pub confidence_score: f64,
    pub behavioral_profile: String,
    pub reasoning: String,
    pub restoration_quality: RestorationQuality,
    pub environmental_factors: EnvironmentalFactors,
    pub vehicle: VehicleFinding,
    pub driver_identity: IdentitySummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_signature: Option<String>,
}

impl ComplexViolationAnalysis {
    /// The ledger classification named by `violation_type`, if it is one
    pub fn violation_kind(&self) -> Option<ViolationKind> {
        let normalized = self.violation_type.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        serde_json::from_value(serde_json::Value::String(normalized)).ok()
    }
}

/// Where the driver is looking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GazeDirection {
    Road,
    Lap,
    Device,
    Passenger,
    /// Any other diversion; unlisted directions land here too
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseEstimation {
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arm_geometry: Option<String>,

    /// 0.0 - 1.0
    pub distraction_level: f64,
}

/// Result of the cabin behavior / gaze analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneUseAnalysis {
    pub violation_detected: bool,
    pub phone_detected: bool,

    /// HAND_TO_EAR, TEXTING_IN_LAP, DASHBOARD_MOUNT or HAND_IN_VIEW
    pub holding_pose: String,

    pub gaze_direction: GazeDirection,
    pub gaze_confidence: f64,
    pub confidence_score: f64,
    pub reasoning: String,
    pub pose_estimation: PoseEstimation,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::decode_response;

    const COMPOSITE: &str = r#"{
        "violationType": "cloned plate",
        "confidenceScore": 0.87,
        "behavioralProfile": "ERRATIC",
        "reasoning": "Registry lists a blue Kia for this plate.",
        "restorationQuality": {
            "plateReconstructionScore": 0.93,
            "biometricIntegrityScore": 0.61,
            "artifactNeutralizationLevel": "PARTIAL"
        },
        "environmentalFactors": {
            "lightingCondition": "Harmattan haze",
            "visibilityRating": 0.4,
            "chromaticIntegrity": 0.72
        },
        "vehicle": {"plate": "AS-1120-22", "make": "Toyota", "model": "Corolla", "color": "Red"},
        "driverIdentity": {
            "idConfirmed": false,
            "matchConfidence": 0.3,
            "occlusionDetected": true,
            "reasoning": "Cap brim hides the eyes."
        },
    }"#;

    #[test]
    fn test_composite_analysis_decodes() {
        let analysis: ComplexViolationAnalysis = decode_response(Some(COMPOSITE)).unwrap();
        assert_eq!(
            analysis.restoration_quality.artifact_neutralization_level,
            ArtifactLevel::Partial
        );
        assert!(analysis.environmental_factors.moisture_interference.is_none());
        assert!(analysis.security_signature.is_none());
        assert_eq!(analysis.violation_kind(), Some(ViolationKind::ClonedPlate));
    }

    #[test]
    fn test_composite_analysis_missing_required_object_is_absent() {
        let without_env = COMPOSITE.replace("\"environmentalFactors\"", "\"unrelated\"");
        assert!(decode_response::<ComplexViolationAnalysis>(Some(&without_env)).is_none());
    }

    #[test]
    fn test_unlisted_artifact_level_keeps_analysis() {
        let reply = COMPOSITE.replace("\"PARTIAL\"", "\"HEAVY_GLARE\"");
        let analysis: ComplexViolationAnalysis = decode_response(Some(&reply)).unwrap();
        assert_eq!(
            analysis.restoration_quality.artifact_neutralization_level,
            ArtifactLevel::Unknown
        );
        assert_eq!(analysis.vehicle.plate, "AS-1120-22");
    }

    #[test]
    fn test_unknown_violation_type_has_no_kind() {
        let mut analysis: ComplexViolationAnalysis = decode_response(Some(COMPOSITE)).unwrap();
        analysis.violation_type = "ILLEGAL_PARKING".to_string();
        assert_eq!(analysis.violation_kind(), None);
    }

    #[test]
    fn test_phone_use_gaze_falls_back_to_other() {
        let reply = r#"{
            "violationDetected": true,
            "phoneDetected": true,
            "holdingPose": "TEXTING_IN_LAP",
            "gazeDirection": "LAP",
            "gazeConfidence": 0.9,
            "confidenceScore": 0.88,
            "reasoning": "Head pitched down for 3s.",
            "poseEstimation": {"description": "Right hand low", "distractionLevel": 0.8}
        }"#;
        let analysis: PhoneUseAnalysis = decode_response(Some(reply)).unwrap();
        assert_eq!(analysis.gaze_direction, GazeDirection::Lap);

        let off_menu = reply.replace("\"LAP\"", "\"CEILING\"");
        let analysis: PhoneUseAnalysis = decode_response(Some(&off_menu)).unwrap();
        assert_eq!(analysis.gaze_direction, GazeDirection::Other);
        assert!(analysis.phone_detected);
    }

    #[test]
    fn test_media_attachment_validation() {
        let media = MediaAttachment::from_bytes("image/jpeg", b"\xff\xd8\xff").unwrap();
        assert_eq!(media.data, "/9j/");
        assert_eq!(media.to_data_url(), "data:image/jpeg;base64,/9j/");

        assert!(matches!(
            MediaAttachment::new("application/pdf", "AAAA"),
            Err(Error::InvalidRequest(_))
        ));
        assert!(MediaAttachment::new("video/mp4", "not base64!").is_err());
        assert!(MediaAttachment::new("image/png", "").is_err());
    }
}
