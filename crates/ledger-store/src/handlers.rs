//! API request handlers for the violation ledger

use ananse_common::{AdjudicationStatus, Error, NewViolation, ViolationRecord};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::ledger::{LedgerAudit, LedgerStore};

/// Shared application state
pub struct AppState {
    pub ledger: Mutex<LedgerStore>,
}

impl AppState {
    pub fn new(ledger: LedgerStore) -> Self {
        Self {
            ledger: Mutex::new(ledger),
        }
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
            Error::InvalidRecord(_) => StatusCode::BAD_REQUEST,
            Error::NotInitialized => StatusCode::SERVICE_UNAVAILABLE,
            _ => {
                error!("Ledger operation failed: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

/// Optional body of an adjudication
#[derive(Debug, Default, Deserialize)]
pub struct AdjudicateRequest {
    pub decision: Option<AdjudicationStatus>,
}

#[derive(Debug, Serialize)]
pub struct AdjudicateResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ViolationResponse {
    pub violation: ViolationRecord,
}

#[derive(Debug, Serialize)]
pub struct ViolationsListResponse {
    pub violations: Vec<ViolationRecord>,
    pub total: usize,
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "ledger-store"
    }))
}

/// List the review queue in ledger order
pub async fn list_violations_handler(
    State(state): State<Arc<AppState>>,
) -> Json<ViolationsListResponse> {
    let ledger = state.ledger.lock().await;
    let violations = ledger.list().to_vec();
    let total = violations.len();

    Json(ViolationsListResponse { violations, total })
}

/// Append a new violation to the ledger
pub async fn append_violation_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewViolation>,
) -> Result<(StatusCode, Json<ViolationResponse>), ApiError> {
    info!("Appending {:?} violation for plate: {}", payload.kind, payload.vehicle.plate);

    let mut ledger = state.ledger.lock().await;
    let violation = ledger.append(payload).await?;

    Ok((StatusCode::CREATED, Json(ViolationResponse { violation })))
}

/// Get a violation by id
pub async fn get_violation_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ViolationResponse>, ApiError> {
    let ledger = state.ledger.lock().await;

    match ledger.get(&id) {
        Some(v) => Ok(Json(ViolationResponse {
            violation: v.clone(),
        })),
        None => Err(ApiError {
            status: StatusCode::NOT_FOUND,
            message: format!("Violation not found: {}", id),
        }),
    }
}

/// Adjudicate a violation, which removes it from the active queue
pub async fn adjudicate_violation_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Option<Json<AdjudicateRequest>>,
) -> Result<Json<AdjudicateResponse>, ApiError> {
    let decision = payload.and_then(|Json(p)| p.decision);
    if decision == Some(AdjudicationStatus::Pending) {
        return Err(ApiError {
            status: StatusCode::BAD_REQUEST,
            message: "decision must be APPROVED or REJECTED".to_string(),
        });
    }

    info!("Adjudicating violation {} ({:?})", id, decision);

    let mut ledger = state.ledger.lock().await;
    let removed = ledger.remove(&id).await?;

    if removed {
        Ok(Json(AdjudicateResponse {
            success: true,
            message: format!("Violation adjudicated: {}", id),
        }))
    } else {
        Err(ApiError {
            status: StatusCode::NOT_FOUND,
            message: format!("Violation not found: {}", id),
        })
    }
}

/// Verify every record and link in the ledger
pub async fn audit_handler(State(state): State<Arc<AppState>>) -> Json<LedgerAudit> {
    let ledger = state.ledger.lock().await;
    Json(ledger.audit())
}
