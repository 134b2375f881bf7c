//! Fetch-priority selection among upcoming videos.
//!
//! Polling attention rotates: a candidate never polled wins outright,
//! otherwise the one polled longest ago does.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::Result;
use crate::database::repositories::FetchHistoryRepository;
use crate::domain::{FetchHistoryEntry, Video};

/// Pick the candidate to poll.
///
/// The first candidate (in input order) with no history is chosen; if all
/// have history, the one whose latest entry is oldest is chosen, ties going
/// to the earlier candidate.
pub fn select_candidate<'a>(
    candidates: &'a [Video],
    history: &[FetchHistoryEntry],
) -> Option<&'a Video> {
    let mut latest: HashMap<&str, DateTime<Utc>> = HashMap::new();
    for entry in history {
        latest
            .entry(entry.source_id.as_str())
            .and_modify(|at| *at = (*at).max(entry.fetched_at))
            .or_insert(entry.fetched_at);
    }

    let mut best: Option<(&Video, DateTime<Utc>)> = None;
    for candidate in candidates {
        let Some(&last_fetched) = latest.get(candidate.source_id.as_str()) else {
            return Some(candidate);
        };
        if best.is_none_or(|(_, oldest)| last_fetched < oldest) {
            best = Some((candidate, last_fetched));
        }
    }
    best.map(|(video, _)| video)
}

/// Chooses which upcoming video's chat to poll this run.
pub struct FetchPrioritySelector {
    history: Arc<dyn FetchHistoryRepository>,
}

impl FetchPrioritySelector {
    pub fn new(history: Arc<dyn FetchHistoryRepository>) -> Self {
        Self { history }
    }

    pub async fn select(&self, candidates: &[Video]) -> Result<Option<Video>> {
        match candidates {
            [] => Ok(None),
            [only] => Ok(Some(only.clone())),
            _ => {
                let source_ids: Vec<String> =
                    candidates.iter().map(|c| c.source_id.clone()).collect();
                let history = self.history.find_by_source_ids(&source_ids).await?;
                let selected = select_candidate(candidates, &history).cloned();
                if let Some(video) = &selected {
                    debug!(
                        source_id = %video.source_id,
                        candidates = candidates.len(),
                        "Selected fetch candidate"
                    );
                }
                Ok(selected)
            }
        }
    }
}
