//! Health check endpoints for liveness and readiness probes.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::ApiResponse;
use crate::AppState;

/// Readiness probe detail.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub scanner: String,
    pub scanner_version: Option<String>,
}

/// Liveness probe: always returns OK if the process is running.
pub async fn live() -> &'static str {
    "OK"
}

/// Readiness probe: checks that the scanner daemon answers.
pub async fn ready(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let (scanner, scanner_version) = match state.orchestrator.client().version().await {
        Ok(version) => ("connected".to_string(), Some(version)),
        Err(e) => {
            tracing::warn!(error = %e, "Scanner health check failed");
            (format!("error: {e}"), None)
        }
    };

    ApiResponse::success(HealthStatus {
        status: "ok".to_string(),
        scanner,
        scanner_version,
    })
}
