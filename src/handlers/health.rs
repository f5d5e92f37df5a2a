use axum::{extract::State, http::StatusCode, Json};
use crate::{models::HealthResponse, state::AppState};
use std::sync::Arc;
use tracing::{debug, warn};

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
    })
}

/// Readiness check endpoint, fails while the document store is unreachable
pub async fn ready_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    debug!("Readiness check requested");
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse {
            status: "ok".to_string(),
            message: "Service is ready".to_string(),
        })),
        Err(e) => {
            warn!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse {
                status: "unavailable".to_string(),
                message: format!("Document store unavailable: {}", e),
            }))
        }
    }
}
