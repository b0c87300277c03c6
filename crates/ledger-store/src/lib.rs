//! Violation Ledger Service
//!
//! Keeps the review queue of violation records as a hash-chained ledger
//! persisted in a single key-value blob, and serves it over REST to the
//! dashboard.

pub mod config;
pub mod handlers;
pub mod ledger;
pub mod seed;
pub mod storage;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::{Backend, Config};
pub use handlers::AppState;
pub use ledger::{LedgerAudit, LedgerStore, DEFAULT_LEDGER_KEY};
pub use storage::{BlobStore, MemoryBlobStore, RedisBlobStore};

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/api/violations",
            get(handlers::list_violations_handler).post(handlers::append_violation_handler),
        )
        .route(
            "/api/violations/{id}",
            get(handlers::get_violation_handler).delete(handlers::adjudicate_violation_handler),
        )
        .route("/api/ledger/audit", get(handlers::audit_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
