//! Chat ingestion for one target: fetch, filter, classify, persist.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use sentiment::NegativityClassifier;

use super::ChatFilter;
use crate::Result;
use crate::database::repositories::{
    ChatRecordRepository, FetchHistoryRepository, VideoRepository,
};
use crate::domain::{ChatRecord, ChatTarget, FetchHistoryEntry, VideoStatus};
use crate::youtube::{ChatFetch, ChatSource};

/// Counts for one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub source_id: String,
    pub fetched: usize,
    pub accepted: usize,
    pub persisted: usize,
    /// Messages dropped because classification failed.
    pub failed: usize,
    /// The chat source reported the chat as permanently ended.
    pub ended: bool,
}

/// Whether the target is a tracked video or the static target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A reconciled video: polls are recorded in fetch history and an
    /// ended chat archives the video.
    Tracked,
    /// The configured static target: never recorded, never archived.
    Static,
}

/// Runs the chat pipeline for a single target.
pub struct ChatIngester {
    source: Arc<dyn ChatSource>,
    filter: ChatFilter,
    classifier: NegativityClassifier,
    videos: Arc<dyn VideoRepository>,
    chats: Arc<dyn ChatRecordRepository>,
    history: Arc<dyn FetchHistoryRepository>,
    max_results: Option<u32>,
}

impl ChatIngester {
    pub fn new(
        source: Arc<dyn ChatSource>,
        filter: ChatFilter,
        classifier: NegativityClassifier,
        videos: Arc<dyn VideoRepository>,
        chats: Arc<dyn ChatRecordRepository>,
        history: Arc<dyn FetchHistoryRepository>,
        max_results: Option<u32>,
    ) -> Self {
        Self {
            source,
            filter,
            classifier,
            videos,
            chats,
            history,
            max_results,
        }
    }

    pub async fn ingest(&self, target: &ChatTarget, kind: TargetKind) -> Result<IngestOutcome> {
        let source_id = target.source_id.as_str();
        let mut outcome = IngestOutcome {
            source_id: source_id.to_string(),
            ..Default::default()
        };

        let messages = match self.source.fetch_messages(target, self.max_results).await? {
            ChatFetch::Ended => {
                outcome.ended = true;
                if kind == TargetKind::Tracked {
                    self.videos
                        .update_status(source_id, VideoStatus::Archived, "")
                        .await?;
                    info!(source_id, "Chat ended, video archived");
                } else {
                    warn!(source_id, "Chat of the static target has ended");
                }
                return Ok(outcome);
            }
            ChatFetch::Messages(messages) => messages,
        };

        if kind == TargetKind::Tracked {
            self.history
                .insert_fetch_history(&FetchHistoryEntry {
                    source_id: source_id.to_string(),
                    fetched_at: Utc::now(),
                })
                .await?;
        }

        outcome.fetched = messages.len();
        let accepted = self.filter.apply(source_id, messages).await?;
        outcome.accepted = accepted.len();
        if accepted.is_empty() {
            return Ok(outcome);
        }

        let mut records = Vec::with_capacity(accepted.len());
        for message in accepted {
            match self.classifier.classify(&message.message).await {
                Ok(classification) => records.push(ChatRecord {
                    source_id: message.source_id,
                    message: message.message,
                    is_negative: classification.is_negative,
                    published_at: message.published_at,
                }),
                Err(e) => {
                    warn!(
                        source_id,
                        published_at = %message.published_at,
                        "Skipping chat message, sentiment analysis failed: {}",
                        e
                    );
                    outcome.failed += 1;
                }
            }
        }

        outcome.persisted = self.chats.insert_chat_records(&records).await? as usize;
        info!(
            source_id,
            fetched = outcome.fetched,
            accepted = outcome.accepted,
            persisted = outcome.persisted,
            failed = outcome.failed,
            "Ingested chat"
        );
        Ok(outcome)
    }
}
