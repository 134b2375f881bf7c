//! Sentiment error types.

use thiserror::Error;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, SentimentError>;

/// Errors that can occur while scoring a message.
#[derive(Error, Debug)]
pub enum SentimentError {
    /// Transport-level failure talking to the analysis service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl SentimentError {
    /// Create a service error.
    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Self::Service {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid-response error.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a generic error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
