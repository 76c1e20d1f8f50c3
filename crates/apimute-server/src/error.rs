//! API error types for the apimute server.
//!
//! Maps core engine errors to HTTP status codes and JSON error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use apimute_core::error::EngineError;

/// API error type for route handlers.
pub enum ApiError {
    /// Bad request (validation failure, malformed body, report not ready).
    BadRequest(String),
    /// Requested test not found.
    NotFound(String),
    /// Operation not valid in the test's current state.
    Conflict(String),
    /// Admission denied, registry is full.
    TooManyRequests(String),
    /// Defined by the contract but not implemented (pause/resume).
    NotImplemented(String),
    /// Internal error (export serialization).
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(e) => Self::BadRequest(e.to_string()),
            e @ EngineError::Overloaded { .. } => Self::TooManyRequests(e.to_string()),
            e @ EngineError::NotFound { .. } => Self::NotFound(e.to_string()),
            e @ EngineError::Conflict { .. } => Self::Conflict(e.to_string()),
            e @ EngineError::NotImplemented { .. } => Self::NotImplemented(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            Self::NotImplemented(msg) => (StatusCode::NOT_IMPLEMENTED, msg),
            Self::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = axum::Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
