use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Only `BadInput` is the caller's fault; every other variant is a server-side
/// classification and its details stay in the logs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad input: {0}")]
    BadInput(String),

    #[error("Upstream rate limited: {0}")]
    UpstreamRateLimited(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadInput(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamRateLimited(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadInput(_) => "BAD_REQUEST",
            AppError::UpstreamRateLimited(_) => "UPSTREAM_RATE_LIMITED",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::RateLimited { .. } => AppError::UpstreamRateLimited(err.to_string()),
            LlmError::Http(_)
            | LlmError::Api { .. }
            | LlmError::EmptyContent
            | LlmError::Parse(_)
            | LlmError::InvalidResponse(_) => AppError::Upstream(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Bad-input and upstream failures were already logged where they were detected.
        let message = match &self {
            AppError::BadInput(msg) => msg.clone(),
            AppError::UpstreamRateLimited(_) => {
                "The analysis service is rate limited. Please try again later.".to_string()
            }
            AppError::Upstream(_) => "Failed to analyze documents with AI service".to_string(),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An unexpected error occurred during analysis".to_string()
            }
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (self.status(), body).into_response()
    }
}
