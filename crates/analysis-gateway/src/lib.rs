//! Analysis Gateway
//!
//! Single boundary between Ananse and the multimodal inference provider.
//! Every reply is decoded defensively: a reply that cannot be decoded into
//! the declared shape is reported as absent rather than as an error.

pub mod config;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod parse;
pub mod prompts;
pub mod provider;
pub mod schema;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use gateway::{AnalysisGateway, ModelSet};
pub use handlers::AppState;
pub use models::{ComplexViolationAnalysis, MediaAttachment, PhoneUseAnalysis};
pub use parse::decode_response;
pub use provider::{
    GeminiClient, GenerateRequest, GenerationConfig, InferenceProvider, InlineData, Part,
    ProviderReply,
};

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/api/analyze/violation",
            post(handlers::analyze_violation_handler),
        )
        .route("/api/analyze/identity", post(handlers::identify_driver_handler))
        .route("/api/analyze/behavior", post(handlers::analyze_behavior_handler))
        .route("/api/evidence/image", post(handlers::evidence_image_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
