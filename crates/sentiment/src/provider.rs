//! Sentiment provider trait and score type.
//!
//! Defines the interface for analysis-service implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Document-level sentiment returned by an analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SentimentScore {
    /// Polarity in `[-1.0, 1.0]`.
    pub score: f32,
    /// Amount of emotional content, `>= 0.0`, independent of polarity.
    pub magnitude: f32,
}

impl SentimentScore {
    /// Score used for text with nothing left to analyze.
    pub const NEUTRAL: SentimentScore = SentimentScore {
        score: 0.0,
        magnitude: 0.0,
    };

    /// Create a new score.
    pub fn new(score: f32, magnitude: f32) -> Self {
        Self { score, magnitude }
    }
}

/// Trait for sentiment analysis services.
#[async_trait]
pub trait SentimentProvider: Send + Sync {
    /// Name of the backing service, used in logs.
    fn name(&self) -> &str;

    /// Analyze plain text and return its document-level sentiment.
    async fn analyze(&self, text: &str) -> Result<SentimentScore>;
}
