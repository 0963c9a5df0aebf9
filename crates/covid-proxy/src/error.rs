//! Error types and their mapping to JSON responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure classes of a single upstream call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection refused, DNS failure or any other transport error.
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    /// The configured timeout (seconds) elapsed.
    #[error("upstream did not answer within {0} seconds")]
    Timeout(u64),

    /// Upstream answered with a non-2xx status.
    #[error("upstream returned status {status}")]
    Http {
        /// Status code as received.
        status: u16,
        /// Raw body, logged but never returned to callers.
        body: String,
    },

    /// Body was not JSON or did not have the expected shape.
    #[error("upstream response malformed: {0}")]
    MalformedResponse(String),

    /// A record was required but the `response` array was empty.
    #[error("upstream returned no records")]
    EmptyResult,
}

/// Errors returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// The upstream call failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Body missing, not JSON, or lacking required fields.
    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    /// No route matches the request path.
    #[error("no route for {0}")]
    NotFound(String),

    /// The path exists but not for this method.
    #[error("method {method} not allowed on {path}")]
    MethodNotAllowed {
        /// Method the caller used.
        method: String,
        /// Requested path.
        path: String,
    },
}

/// Unified failure body: `{"success": false, "error": {...}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// What went wrong.
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error class, e.g. `upstream_timeout`
    pub kind: String,
    /// Human-readable description.
    pub message: String,
}

impl AppError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Upstream(UpstreamError::Unreachable(_)) => {
                (StatusCode::BAD_GATEWAY, "upstream_unreachable")
            }
            AppError::Upstream(UpstreamError::Timeout(_)) => {
                (StatusCode::GATEWAY_TIMEOUT, "upstream_timeout")
            }
            AppError::Upstream(UpstreamError::Http { .. }) => {
                (StatusCode::BAD_GATEWAY, "upstream_http_error")
            }
            AppError::Upstream(UpstreamError::MalformedResponse(_)) => {
                (StatusCode::BAD_GATEWAY, "upstream_malformed_response")
            }
            AppError::Upstream(UpstreamError::EmptyResult) => {
                (StatusCode::NOT_FOUND, "upstream_empty_result")
            }
            AppError::InvalidRequestBody(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_request_body")
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::MethodNotAllowed { .. } => {
                (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed")
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequestBody(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        match &self {
            AppError::Upstream(e) => {
                tracing::warn!(kind, "Responding {} to upstream failure: {}", status, e)
            }
            AppError::InvalidRequestBody(msg) => tracing::debug!("Rejected request body: {}", msg),
            other => tracing::debug!("Responding {}: {}", status, other),
        }

        let body = ErrorBody {
            success: false,
            error: ErrorDetail {
                kind: kind.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}
