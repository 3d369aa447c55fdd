//! Scan routes: trigger a scan run and list the attack catalog.

use axum::{extract::State, Json};
use reqwest::Url;
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::models::scan::ScanReport;
use crate::services::attack_catalog::AttackClass;
use crate::AppState;

/// Body of a scan request.
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub url: String,
}

/// POST /api/v1/scans: scan a target through every enabled phase.
///
/// The run is spawned so that a dropped connection cannot cancel it halfway
/// through a phase.
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<ScanRequest>,
) -> Result<Json<ApiResponse<ScanReport>>, AppError> {
    let url = body.url.trim().to_string();
    validate_target(&url)?;

    let orchestrator = state.orchestrator.clone();
    let target = url.clone();
    let report = tokio::spawn(async move { orchestrator.run_scanner(&target).await })
        .await
        .map_err(|e| AppError::Internal(format!("Scan task for {url} did not finish: {e}")))?;

    match report {
        Some(report) => Ok(ApiResponse::success(report)),
        None => Err(AppError::Conflict(format!(
            "{url} was the target of the previous scan"
        ))),
    }
}

/// GET /api/v1/attack-classes: attack classes in the order they are scanned.
pub async fn attack_classes(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<AttackClass>>> {
    ApiResponse::success(state.orchestrator.catalog().classes().to_vec())
}

/// Targets must be absolute http(s) URLs.
fn validate_target(url: &str) -> Result<(), AppError> {
    if url.is_empty() {
        return Err(AppError::Validation("url is required".to_string()));
    }
    let parsed = Url::parse(url)
        .map_err(|e| AppError::Validation(format!("Invalid url '{url}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "Unsupported scheme '{}', expected http or https",
            parsed.scheme()
        )));
    }
    Ok(())
}
