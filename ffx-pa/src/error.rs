//! Error types for ffx-pa HTTP handlers
//!
//! Client-class failures (bad upload, missing credential, upstream 4xx) map
//! to 400. Upstream outages map to 502, and everything else to 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{AnalysisError, NormalizeError, ScoringError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing credential (400)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Scoring service unavailable or failing (502)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Scoring(ScoringError::Configuration(msg)) => ApiError::Configuration(msg),
            AnalysisError::Scoring(e @ ScoringError::Transport { .. }) => {
                if e.is_client_error() {
                    ApiError::BadRequest(e.to_string())
                } else {
                    ApiError::Upstream(e.to_string())
                }
            }
            AnalysisError::Normalize(e @ NormalizeError::MalformedPayload(_)) => {
                ApiError::Internal(e.to_string())
            }
            AnalysisError::Staging(e) => ApiError::Io(e),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Configuration(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Configuration(_) => "CONFIGURATION_ERROR",
            ApiError::Upstream(_) => "UPSTREAM_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::Io(_) => "IO_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
