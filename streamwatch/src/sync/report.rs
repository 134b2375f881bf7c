use serde::Serialize;
use uuid::Uuid;

use crate::chat::IngestOutcome;
use crate::reconcile::{ReconcileOutcome, RefreshOutcome};

/// Summary of one synchronization run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub reconcile: ReconcileOutcome,
    /// Present when the upcoming refresh was requested.
    pub refresh: Option<RefreshOutcome>,
    /// Chat ingestion was skipped because a tracked video is live.
    pub chat_paused: bool,
    pub static_chat: Option<IngestOutcome>,
    pub selected_source_id: Option<String>,
    pub chat: Option<IngestOutcome>,
    pub elapsed_ms: u64,
}

impl SyncReport {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            reconcile: ReconcileOutcome::default(),
            refresh: None,
            chat_paused: false,
            static_chat: None,
            selected_source_id: None,
            chat: None,
            elapsed_ms: 0,
        }
    }

    /// Chat records written across both targets.
    pub fn persisted_chats(&self) -> usize {
        self.static_chat
            .iter()
            .chain(self.chat.iter())
            .map(|outcome| outcome.persisted)
            .sum()
    }
}
