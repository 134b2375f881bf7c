//! Negativity classification.

use std::sync::Arc;

use tracing::trace;

use crate::error::Result;
use crate::normalize::TextNormalizer;
use crate::provider::{SentimentProvider, SentimentScore};

/// Negativity threshold factor applied to the magnitude.
pub const MAGNITUDE_FACTOR: f32 = 0.5;

/// Whether a score counts as negative: `score < 0.5 * magnitude`.
///
/// The threshold scales with magnitude, so an emotionally intense message
/// with a slightly positive score can still be flagged, while a neutral
/// low-magnitude message needs a clearly negative score.
pub fn is_negative(score: SentimentScore) -> bool {
    score.score < MAGNITUDE_FACTOR * score.magnitude
}

/// Result of classifying one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Text after normalization, as sent to the provider.
    pub normalized: String,
    /// Score returned by the provider (neutral for empty text).
    pub score: SentimentScore,
    /// Negativity flag.
    pub is_negative: bool,
}

/// Normalizes chat messages and flags negative ones.
#[derive(Clone)]
pub struct NegativityClassifier {
    normalizer: TextNormalizer,
    provider: Arc<dyn SentimentProvider>,
}

impl NegativityClassifier {
    /// Create a classifier with the default normalizer.
    pub fn new(provider: Arc<dyn SentimentProvider>) -> Self {
        Self {
            normalizer: TextNormalizer::new(),
            provider,
        }
    }

    /// Replace the normalizer.
    pub fn with_normalizer(mut self, normalizer: TextNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Name of the underlying provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Normalize and classify a raw message.
    ///
    /// A message that is empty after normalization is scored neutral without
    /// calling the provider. Provider failures are returned to the caller,
    /// which decides whether to skip the message.
    pub async fn classify(&self, raw: &str) -> Result<Classification> {
        let normalized = self.normalizer.normalize(raw);

        let score = if normalized.is_empty() {
            SentimentScore::NEUTRAL
        } else {
            self.provider.analyze(&normalized).await?
        };

        let negative = is_negative(score);
        trace!(
            provider = self.provider.name(),
            score = score.score,
            magnitude = score.magnitude,
            is_negative = negative,
            "Classified message"
        );

        Ok(Classification {
            normalized,
            score,
            is_negative: negative,
        })
    }
}

impl std::fmt::Debug for NegativityClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NegativityClassifier")
            .field("normalizer", &self.normalizer)
            .field("provider", &self.provider.name())
            .finish()
    }
}
