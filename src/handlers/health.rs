//! Health check handler

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub storage_backend: String,
    pub environment: String,
    pub version: String,
}

/// GET /health - Liveness plus store reachability
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let storage = match state.auth_service.challenge_store().ping().await {
        Ok(()) => "connected".to_string(),
        Err(e) => {
            tracing::error!(error = %e, "Challenge store health check failed");
            "unreachable".to_string()
        }
    };

    let (status, code) = if storage == "connected" {
        ("healthy", StatusCode::OK)
    } else {
        ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            storage,
            storage_backend: state.storage_backend.to_string(),
            environment: state.environment.as_str().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
