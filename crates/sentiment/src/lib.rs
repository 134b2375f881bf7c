//! Sentiment: negativity flagging for live chat messages.
//!
//! This crate turns a raw chat message into a boolean "negative" flag that
//! downstream moderation can act on.
//!
//! ## Core Types
//!
//! - [`TextNormalizer`] - Strips stamp tokens and emoji clusters, applies NFKC
//! - [`SentimentScore`] - A `(score, magnitude)` pair returned by an analysis service
//! - [`SentimentProvider`] - Trait for analysis-service implementations
//! - [`NegativityClassifier`] - Normalizes a message and classifies it
//!
//! ## Providers
//!
//! - [`GoogleLanguageProvider`] - Google Cloud Natural Language `analyzeSentiment`

pub mod classifier;
pub mod error;
pub mod google;
pub mod normalize;
pub mod provider;

pub use classifier::{Classification, NegativityClassifier, is_negative};
pub use error::{Result, SentimentError};
pub use google::GoogleLanguageProvider;
pub use normalize::{TextNormalizer, is_emoji_leading, strip_emoji};
pub use provider::{SentimentProvider, SentimentScore};
