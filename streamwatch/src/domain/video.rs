//! Video entity and its lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Broadcast lifecycle status.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoStatus {
    /// Not yet classified. Never persisted.
    #[default]
    Undefined,
    /// Published, scheduled, not started.
    Upcoming,
    /// Currently broadcasting.
    Live,
    /// Finished, cancelled or never a broadcast.
    Archived,
}

impl VideoStatus {
    /// Whether the video exposes a pollable chat in this status.
    pub fn has_chat(&self) -> bool {
        matches!(self, Self::Upcoming | Self::Live)
    }
}

/// Canonical record of one broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub channel_id: String,
    /// Unique key.
    pub source_id: String,
    pub title: String,
    pub description: String,
    /// Live chat identifier; empty unless the video is live or upcoming.
    pub chat_handle: String,
    pub status: VideoStatus,
    pub published_at: DateTime<Utc>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Check the invariants every persisted row must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.source_id.is_empty() {
            return Err(Error::item_parse("video has an empty source id"));
        }
        if self.status == VideoStatus::Undefined {
            return Err(Error::item_parse(format!(
                "video {} has undefined status",
                self.source_id
            )));
        }
        if let Some(scheduled_at) = self.scheduled_at
            && scheduled_at < self.published_at
        {
            return Err(Error::item_parse(format!(
                "video {} is scheduled at {} before its publication at {}",
                self.source_id, scheduled_at, self.published_at
            )));
        }
        Ok(())
    }

    /// Move to `Archived`, dropping the chat handle.
    pub fn archive(&mut self) {
        self.status = VideoStatus::Archived;
        self.chat_handle.clear();
    }
}

/// One feed entry for one cycle. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedAnnouncement {
    pub channel_id: String,
    pub source_id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw metadata for one video, as resolved by the metadata source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoMetadata {
    pub source_id: String,
    /// Broadcast-content label (`live`, `upcoming`, `none`, `completed`).
    pub broadcast_label: String,
    /// RFC 3339 publication instant.
    pub published_at: String,
    pub live_details: Option<LiveStreamingDetails>,
}

/// Live-streaming detail block; absent for plain uploads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveStreamingDetails {
    pub chat_handle: Option<String>,
    /// RFC 3339 scheduled start.
    pub scheduled_start: Option<String>,
}
