// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::{DatabaseError, StoreError};
use crate::filter::FilterError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    MissingField(String),
    InvalidField(String),
    InvalidJson(String),
    BadCollection(String),
    BadPipeline(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    StoreError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::MissingField(_) => 400,
            ApiError::InvalidField(_) => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::BadCollection(_) => 400,
            ApiError::BadPipeline(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::StoreError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::MissingField(msg) => msg,
            ApiError::InvalidField(msg) => msg,
            ApiError::InvalidJson(msg) => msg,
            ApiError::BadCollection(msg) => msg,
            ApiError::BadPipeline(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::StoreError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for logs
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::MissingField(_) => "MISSING_FIELD",
            ApiError::InvalidField(_) => "INVALID_FIELD",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::BadCollection(_) => "BAD_COLLECTION",
            ApiError::BadPipeline(_) => "BAD_PIPELINE",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::StoreError(_) => "STORE_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({ "error": self.message() })
    }
}

impl ApiError {
    pub fn missing_keys(keys: &[&str]) -> Self {
        ApiError::MissingField(format!("missing required keys: {}", keys.join(", ")))
    }

    pub fn missing_field(message: impl Into<String>) -> Self {
        ApiError::MissingField(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn store_error(message: impl Into<String>) -> Self {
        ApiError::StoreError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        let message = err.to_string();
        match err {
            FilterError::MissingField(_) => ApiError::MissingField(message),
            FilterError::InvalidField { .. } | FilterError::InvalidFilter(_) => {
                ApiError::InvalidField(message)
            }
            FilterError::BadCollection(_) => ApiError::BadCollection(message),
            FilterError::BadPipeline(_) => ApiError::BadPipeline(message),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        // Log the real error but keep driver detail away from clients
        tracing::error!("Store error: {}", err);
        match err {
            StoreError::Config(_) => ApiError::store_error("Store is misconfigured"),
            StoreError::Unavailable(_) => ApiError::store_error("Store unavailable"),
            StoreError::Driver(_) => ApiError::store_error("Database error occurred"),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Filter(e) => e.into(),
            DatabaseError::Store(e) => e.into(),
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::Encode(e) => {
                tracing::error!("JSON serialization error: {}", e);
                ApiError::store_error("Failed to format response")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("{} ({}): {}", self.error_code(), status.as_u16(), self.message());
        } else {
            tracing::debug!("{} ({}): {}", self.error_code(), status.as_u16(), self.message());
        }
        (status, Json(self.to_json())).into_response()
    }
}
