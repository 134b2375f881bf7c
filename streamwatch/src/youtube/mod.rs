//! YouTube collaborators.
//!
//! The traits are what the reconciler and the chat ingester depend on; the
//! HTTP clients below are thin wrappers over the public feed and the Data
//! API v3.

pub mod data;
pub mod feed;
mod models;

pub use data::YouTubeDataClient;
pub use feed::{YouTubeFeedClient, parse_feed};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;
use crate::domain::{ChatMessage, ChatTarget, FeedAnnouncement, VideoMetadata};

/// Maximum number of ids per metadata lookup.
pub const MAX_METADATA_BATCH: usize = 50;

/// Source of per-channel video announcements.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Announcements for `channel_id` whose update instant is after
    /// `watermark`, in feed order.
    async fn fetch_announcements(
        &self,
        channel_id: &str,
        watermark: DateTime<Utc>,
    ) -> Result<Vec<FeedAnnouncement>>;
}

/// Source of authoritative per-video metadata.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Resolve at most [`MAX_METADATA_BATCH`] ids. Unknown ids are omitted
    /// from the result.
    async fn fetch_metadata(&self, source_ids: &[String]) -> Result<Vec<VideoMetadata>>;
}

/// Outcome of one chat poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatFetch {
    /// Messages in ascending `published_at` order.
    Messages(Vec<ChatMessage>),
    /// The chat has permanently ended.
    Ended,
}

/// Source of live chat messages.
#[async_trait]
pub trait ChatSource: Send + Sync {
    async fn fetch_messages(
        &self,
        target: &ChatTarget,
        max_results: Option<u32>,
    ) -> Result<ChatFetch>;
}
