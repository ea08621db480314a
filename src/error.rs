//! Error taxonomy for the generation pipeline.
//!
//! Every failure mode degrades to a displayed message; nothing here is fatal
//! to the process. The categories mirror how failures surface to callers:
//! client errors are rejected before any outbound call, configuration and
//! upstream errors come back through the normal `{error, code}` envelope,
//! and content-safety findings travel as non-fatal warnings instead of
//! through this type.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Failures surfaced by the generation service.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// Bad prompt shape or length; rejected before any outbound call.
    #[error("{0}")]
    InvalidPrompt(String),

    /// The API credential is absent from the environment and configuration.
    #[error("{0} is not configured")]
    MissingCredential(&'static str),

    /// Upstream answered with a non-2xx status.
    #[error("API Error: {status} - {message}")]
    UpstreamStatus { status: u16, message: String },

    /// Upstream answered 2xx but without the expected nested text payload.
    #[error("Invalid response format from generation API")]
    UpstreamShape,

    /// The single request deadline expired; the in-flight call was cancelled.
    #[error("Failed to generate code: request timed out after {0}s")]
    UpstreamTimeout(u64),

    /// Transport-level failure reaching the generation endpoint.
    #[error("Failed to generate code: {0}")]
    UpstreamTransport(String),

    /// Catch-all for unexpected failures inside the endpoint.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Category label used for metrics and structured logs.
    pub fn category(&self) -> &'static str {
        match self {
            ServiceError::InvalidPrompt(_) => "client_error",
            ServiceError::MissingCredential(_) => "config_error",
            ServiceError::UpstreamStatus { .. } | ServiceError::UpstreamShape => "upstream_error",
            ServiceError::UpstreamTimeout(_) | ServiceError::UpstreamTransport(_) => "timeout",
            ServiceError::Internal(_) => "server_error",
        }
    }

    /// Whether a caller could reasonably try again unchanged.
    ///
    /// The service itself never retries (single attempt per request).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::UpstreamTimeout(_)
                | ServiceError::UpstreamTransport(_)
                | ServiceError::Internal(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidPrompt(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = if status == StatusCode::BAD_REQUEST {
            json!({ "error": self.to_string() })
        } else {
            json!({ "error": self.to_string(), "code": "" })
        };
        (status, Json(body)).into_response()
    }
}
