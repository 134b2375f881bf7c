//! Application-wide error types.

use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseSqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream error from {service}: {message}")]
    Upstream { service: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Item skipped: {0}")]
    ItemParse(String),

    #[error("Sentiment error: {0}")]
    Sentiment(#[from] sentiment::SentimentError),

    #[error("Sync deadline of {0:?} exceeded")]
    DeadlineExceeded(std::time::Duration),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn item_parse(msg: impl Into<String>) -> Self {
        Self::ItemParse(msg.into())
    }

    /// Errors scoped to a single batch element; the caller skips the item
    /// and continues with its siblings.
    pub fn is_item_level(&self) -> bool {
        matches!(self, Self::ItemParse(_) | Self::Sentiment(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_level_classification() {
        assert!(Error::item_parse("bad timestamp").is_item_level());
        assert!(Error::Sentiment(sentiment::SentimentError::other("boom")).is_item_level());
        assert!(!Error::upstream("feed", "503").is_item_level());
        assert!(!Error::config("missing key").is_item_level());
        assert!(!Error::DeadlineExceeded(std::time::Duration::from_secs(1)).is_item_level());
    }

    #[test]
    fn test_display() {
        let err = Error::upstream("metadata", "quota exceeded");
        assert_eq!(
            err.to_string(),
            "Upstream error from metadata: quota exceeded"
        );
    }
}
