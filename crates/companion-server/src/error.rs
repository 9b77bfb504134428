use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use companion_core::error::CoreError;
use thiserror::Error;

/// Stable error code constants.
///
/// Clients should match on `code` from `{"code": "NOT_FOUND", "message": "..."}`.
/// Codes never change; messages may be reworded.
pub mod error_code {
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Error surface of the HTTP layer.
///
/// Every variant maps to a stable code and an HTTP status; the response
/// body is always `{"code": ..., "message": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Input data is missing or malformed. HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// Missing, malformed or expired credentials. HTTP 401.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed to touch the target subject's data.
    /// Deliberately message-free so the response reveals nothing about
    /// why or about whom. HTTP 403.
    #[error("forbidden")]
    Forbidden,

    /// Resource does not exist. HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate resource. HTTP 409.
    #[error("{0}")]
    Conflict(String),

    /// Unexpected server-side failure. Details go to the log, never to
    /// the caller. HTTP 500.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => error_code::VALIDATION_FAILED,
            ApiError::Unauthorized(_) => error_code::UNAUTHENTICATED,
            ApiError::Forbidden => error_code::PERMISSION_DENIED,
            ApiError::NotFound(_) => error_code::NOT_FOUND,
            ApiError::Conflict(_) => error_code::ALREADY_EXISTS,
            ApiError::Internal(_) => error_code::INTERNAL,
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(msg) => ApiError::NotFound(msg),
            CoreError::InvalidInput(msg) => ApiError::Validation(msg),
            CoreError::Forbidden(_) => ApiError::Forbidden,
            CoreError::AlreadyExists(msg) => ApiError::Conflict(msg),
            CoreError::Database(err) => {
                tracing::error!("database error: {err}");
                ApiError::Internal("server error".to_string())
            }
            CoreError::Migration(err) => {
                tracing::error!("migration error: {err}");
                ApiError::Internal("server error".to_string())
            }
            CoreError::Io(err) => {
                tracing::error!("io error: {err}");
                ApiError::Internal("server error".to_string())
            }
        }
    }
}
