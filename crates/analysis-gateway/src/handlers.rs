//! API request handlers for the analysis gateway

use ananse_common::{DriverIdentity, Error};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::gateway::AnalysisGateway;
use crate::models::{ComplexViolationAnalysis, MediaAttachment, PhoneUseAnalysis};

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Shared application state
pub struct AppState {
    pub gateway: AnalysisGateway,
}

impl AppState {
    pub fn new(gateway: AnalysisGateway) -> Self {
        Self { gateway }
    }
}

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::Provider(_) => {
                error!("Provider call failed: {}", err);
                StatusCode::BAD_GATEWAY
            }
            _ => {
                error!("Analysis failed: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

/// Composite violation analysis request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationAnalysisRequest {
    pub instruction: Option<String>,

    /// Base64 image
    pub image: Option<String>,

    pub mime_type: Option<String>,
}

/// Identity verification request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRequest {
    pub instruction: Option<String>,

    /// Base64 cabin image
    pub image: String,

    pub mime_type: Option<String>,
}

/// Behavior analysis request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorRequest {
    pub instruction: Option<String>,

    /// Base64 video or image
    pub media: String,

    pub mime_type: String,
}

#[derive(Debug, Deserialize)]
pub struct EvidenceImageRequest {
    pub prompt: String,
}

/// Decoded analysis, `null` when the provider reply could not be decoded
#[derive(Debug, Serialize)]
pub struct AnalysisResponse<T> {
    pub analysis: Option<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceImageResponse {
    pub image_url: Option<String>,
}

fn image_attachment(data: String, mime_type: Option<String>) -> Result<MediaAttachment, Error> {
    MediaAttachment::new(
        mime_type.unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string()),
        data,
    )
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "analysis-gateway"
    }))
}

/// Composite violation analysis
pub async fn analyze_violation_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ViolationAnalysisRequest>,
) -> Result<Json<AnalysisResponse<ComplexViolationAnalysis>>, ApiError> {
    let image = payload
        .image
        .map(|data| image_attachment(data, payload.mime_type))
        .transpose()?;

    info!("Composite analysis requested (image: {})", image.is_some());

    let analysis = state
        .gateway
        .analyze_complex_violation(payload.instruction.as_deref(), image.as_ref())
        .await?;

    Ok(Json(AnalysisResponse { analysis }))
}

/// Driver identity verification
pub async fn identify_driver_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IdentityRequest>,
) -> Result<Json<AnalysisResponse<DriverIdentity>>, ApiError> {
    let image = image_attachment(payload.image, payload.mime_type)?;

    info!("Identity verification requested");

    let analysis = state
        .gateway
        .identify_driver(payload.instruction.as_deref(), &image)
        .await?;

    Ok(Json(AnalysisResponse { analysis }))
}

/// Cabin phone use and gaze analysis
pub async fn analyze_behavior_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BehaviorRequest>,
) -> Result<Json<AnalysisResponse<PhoneUseAnalysis>>, ApiError> {
    let media = MediaAttachment::new(payload.mime_type, payload.media)?;

    info!("Behavior analysis requested ({})", media.mime_type);

    let analysis = state
        .gateway
        .analyze_behavior(payload.instruction.as_deref(), &media)
        .await?;

    Ok(Json(AnalysisResponse { analysis }))
}

/// Evidence image generation
pub async fn evidence_image_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EvidenceImageRequest>,
) -> Result<Json<EvidenceImageResponse>, ApiError> {
    if payload.prompt.trim().is_empty() {
        return Err(ApiError {
            status: StatusCode::BAD_REQUEST,
            message: "prompt must not be empty".to_string(),
        });
    }

    let image_url = state.gateway.generate_evidence_image(&payload.prompt).await?;

    Ok(Json(EvidenceImageResponse { image_url }))
}
