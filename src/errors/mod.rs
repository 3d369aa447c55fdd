//! Unified error handling: scanner errors plus the API response envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error detail in the API response envelope.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// Consistent JSON envelope for all API responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a successful result in the envelope.
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            data: Some(data),
            error: None,
        })
    }

    /// Wrap an error in the envelope.
    pub fn error(code: &str, message: &str) -> Json<Self> {
        Json(Self {
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        })
    }
}

/// Failures talking to the scanner daemon or driving one of its scans.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Scanner daemon unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Scanner daemon fault {code}: {message}")]
    Daemon { code: String, message: String },

    #[error("Unexpected scanner response: {0}")]
    UnexpectedResponse(String),

    #[error("Scan phase timed out after {polls} stalled polls")]
    PhaseTimeout { polls: u32 },
}

impl ScanError {
    /// True when the daemon could not be reached or answered with a fault.
    pub fn is_client_communication(&self) -> bool {
        !matches!(self, Self::PhaseTimeout { .. })
    }
}

/// Application error type mapping to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Scanner error: {0}")]
    Scanner(#[from] ScanError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "DUPLICATE_SCAN", msg.clone()),
            AppError::Scanner(e) => {
                tracing::error!(error = %e, "Scanner error");
                (StatusCode::BAD_GATEWAY, "SCANNER_ERROR", e.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, ApiResponse::<()>::error(code, &message)).into_response()
    }
}
