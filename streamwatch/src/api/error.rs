//! API error handling.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::Error;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// API error type that can be converted to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a 500 Internal Server Error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    /// Create a 503 Service Unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", message)
    }

    /// Create a 504 Gateway Timeout error.
    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, "DEADLINE_EXCEEDED", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::DeadlineExceeded(_) => {
                tracing::error!("Sync run aborted: {}", err);
                ApiError::deadline_exceeded(err.to_string())
            }
            Error::Upstream { .. } | Error::Http(_) => {
                tracing::error!("Upstream call failed: {}", err);
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "UPSTREAM_ERROR",
                    err.to_string(),
                )
            }
            Error::DatabaseSqlx(e) => {
                tracing::error!("Database error: {}", e);
                ApiError::internal("Database error occurred")
            }
            Error::Migration(e) => {
                tracing::error!("Migration error: {}", e);
                ApiError::internal("Database error occurred")
            }
            _ => {
                tracing::error!("Unexpected error: {}", err);
                ApiError::internal("An unexpected error occurred")
            }
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_deadline_maps_to_gateway_timeout() {
        let api_err: ApiError = Error::DeadlineExceeded(Duration::from_secs(60)).into();
        assert_eq!(api_err.status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(api_err.code, "DEADLINE_EXCEEDED");
    }

    #[test]
    fn test_upstream_maps_to_internal() {
        let api_err: ApiError = Error::upstream("feed", "503 Service Unavailable").into();
        assert_eq!(api_err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_err.code, "UPSTREAM_ERROR");
        assert!(api_err.message.contains("feed"));
    }

    #[test]
    fn test_other_errors_hide_details() {
        let api_err: ApiError = Error::Other("secret detail".to_string()).into();
        assert_eq!(api_err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api_err.message.contains("secret"));
    }
}
