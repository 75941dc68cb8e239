//! ABOUTME: HTTP error mapping for API handlers
//! ABOUTME: Translates core errors into status codes and error bodies

use crate::models::ErrorResponse;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;
use validator::ValidationErrors;

/// API error carrying the status code and serializable body to send.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse::new(error, message),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.body.error, self.body.message)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(&self.body)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let fields: Vec<String> = errors.field_errors().keys().map(|f| f.to_string()).collect();
        Self::new(
            StatusCode::BAD_REQUEST,
            "validation_failed",
            format!("Invalid fields: {}", fields.join(", ")),
        )
    }
}

impl From<halo_core::Error> for ApiError {
    fn from(error: halo_core::Error) -> Self {
        match error {
            halo_core::Error::NotFound(msg) => Self::not_found(msg),
            halo_core::Error::IdentityMismatch(msg) => {
                Self::new(StatusCode::BAD_REQUEST, "identity_mismatch", msg)
            }
            halo_core::Error::Validation(msg) => {
                Self::new(StatusCode::BAD_REQUEST, "validation_failed", msg)
            }
            halo_core::Error::Identity(msg) => {
                Self::new(StatusCode::UNAUTHORIZED, "identity_error", msg)
            }
            halo_core::Error::PoolExhausted(msg) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "store_busy", msg)
            }
            halo_core::Error::Store(msg) => Self::internal(format!("Store error: {}", msg)),
            halo_core::Error::Cache(msg) => Self::internal(format!("Cache error: {}", msg)),
            halo_core::Error::Config(msg) => {
                Self::internal(format!("Configuration error: {}", msg))
            }
            halo_core::Error::Io(e) => Self::internal(format!("IO error: {}", e)),
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
