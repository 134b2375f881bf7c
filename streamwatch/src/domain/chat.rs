//! Chat messages, persisted chat records and fetch history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat message as returned by the chat source. Transient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub author_channel_id: String,
    pub message: String,
    pub published_at: DateTime<Utc>,
    pub source_id: String,
}

/// A classified chat message, written once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub source_id: String,
    pub message: String,
    pub is_negative: bool,
    pub published_at: DateTime<Utc>,
}

/// One chat poll of one video. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchHistoryEntry {
    pub source_id: String,
    pub fetched_at: DateTime<Utc>,
}

/// A video whose chat should be polled this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTarget {
    pub source_id: String,
    #[serde(alias = "chatId")]
    pub chat_handle: String,
}
