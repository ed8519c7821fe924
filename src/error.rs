//! Error handling module
//!
//! HTTP-facing error type and its response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Body message for requests whose JSON could not be decoded
pub const MALFORMED_BODY: &str = "Please check that all fields are correctly filled.";

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Missing token")]
    MissingToken,

    /// Refusal relayed from the auth server
    #[error("{message}")]
    AuthRejected { status: StatusCode, message: String },

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors (5xx)
    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn malformed_body() -> Self {
        AppError::InvalidRequest(MALFORMED_BODY.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MissingToken => StatusCode::UNAUTHORIZED,
            AppError::AuthRejected { status, .. } => *status,
            AppError::Domain(DomainError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Domain(DomainError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Domain(DomainError::Unexpected(_)) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_code = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(_) => "invalid_request",

            // 401 Unauthorized
            AppError::MissingToken => "missing_token",

            // Status chosen by the auth server
            AppError::AuthRejected { .. } => "unauthorized",

            AppError::Domain(DomainError::NotFound(_)) => "not_found",
            AppError::Domain(DomainError::Validation(_)) => "validation_error",
            AppError::Domain(DomainError::Unexpected(_)) => "unexpected_error",

            // 500 Internal Server Error
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "internal_error"
            }
        };

        let details = match &self {
            AppError::AuthRejected { status, .. } => Some(status.as_u16().to_string()),
            _ => None,
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (self.status(), Json(body)).into_response()
    }
}
