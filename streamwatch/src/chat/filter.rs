//! Author allow-list and deduplication against persisted chat.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::Result;
use crate::database::repositories::ChatRecordRepository;
use crate::database::time::datetime_to_ms;
use crate::domain::ChatMessage;

/// Keep messages whose author is allow-listed, preserving order.
pub fn filter_allowed(messages: Vec<ChatMessage>, allowlist: &HashSet<String>) -> Vec<ChatMessage> {
    messages
        .into_iter()
        .filter(|m| allowlist.contains(&m.author_channel_id))
        .collect()
}

/// Suffix of an ascending batch strictly after `threshold`.
///
/// The batch is assumed sorted by `published_at`; the scan stops at the
/// first newer message. Instants compare at the stored millisecond precision.
pub fn newer_than(
    mut messages: Vec<ChatMessage>,
    threshold: Option<DateTime<Utc>>,
) -> Vec<ChatMessage> {
    let Some(threshold) = threshold else {
        return messages;
    };
    let threshold = datetime_to_ms(threshold);
    match messages
        .iter()
        .position(|m| datetime_to_ms(m.published_at) > threshold)
    {
        Some(start) => messages.split_off(start),
        None => Vec::new(),
    }
}

/// Reduces a chat batch to new messages from allowed authors.
pub struct ChatFilter {
    chats: Arc<dyn ChatRecordRepository>,
    allowlist: HashSet<String>,
}

impl ChatFilter {
    pub fn new(chats: Arc<dyn ChatRecordRepository>, allowlist: HashSet<String>) -> Self {
        Self { chats, allowlist }
    }

    pub async fn apply(&self, source_id: &str, messages: Vec<ChatMessage>) -> Result<Vec<ChatMessage>> {
        let fetched = messages.len();
        let allowed = filter_allowed(messages, &self.allowlist);
        if allowed.is_empty() {
            debug!(source_id, fetched, "No chat from allowed authors");
            return Ok(allowed);
        }

        let threshold = self.chats.latest_published_at(source_id).await?;
        let fresh = newer_than(allowed, threshold);
        debug!(
            source_id,
            fetched,
            fresh = fresh.len(),
            "Filtered chat batch"
        );
        Ok(fresh)
    }
}
