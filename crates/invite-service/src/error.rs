//! Control surface error types.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by the HTTP control surface.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Auto-invite process is already running")]
    AlreadyRunning,

    #[error("Auto-invite process is not running")]
    NotRunning,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServiceError::Unauthorized => (StatusCode::UNAUTHORIZED, "AUTHENTICATION_REQUIRED"),
            ServiceError::AlreadyRunning => (StatusCode::CONFLICT, "ALREADY_RUNNING"),
            ServiceError::NotRunning => (StatusCode::CONFLICT, "NOT_RUNNING"),
            ServiceError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            message: self.to_string(),
            code: code.to_string(),
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, ServiceError::Unauthorized) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"auto-invite\""),
            );
        }
        response
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(e: tokio::task::JoinError) -> Self {
        ServiceError::Internal(format!("Scheduler task failed: {}", e))
    }
}
