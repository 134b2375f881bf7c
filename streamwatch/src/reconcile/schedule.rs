//! Upcoming-schedule refresh.
//!
//! Re-resolves every persisted `Upcoming` video and writes back status,
//! chat handle and schedule changes. Videos the metadata source no longer
//! returns, and videos whose schedule lies too far in the past without
//! ever going live, are archived.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::{ResolvedVideo, resolve_all};
use crate::Result;
use crate::database::repositories::VideoRepository;
use crate::domain::{Video, VideoStatus};
use crate::youtube::MetadataSource;

/// Why a refresh archived a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ArchiveReason {
    /// The metadata now reports the broadcast as finished.
    Finished,
    /// The metadata source no longer returns the video.
    Missing,
    /// Still upcoming long after its scheduled start.
    Stale,
}

/// Counts for one refresh pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshOutcome {
    pub checked: usize,
    pub updated: usize,
    pub archived: usize,
}

/// Compute the refreshed state of one upcoming video.
///
/// Returns `None` when nothing changes. `resolved` is `None` when the
/// metadata source did not return the video.
pub fn plan_refresh(
    video: &Video,
    resolved: Option<&ResolvedVideo>,
    now: DateTime<Utc>,
    stale_after: Duration,
) -> Option<(Video, Option<ArchiveReason>)> {
    let mut next = video.clone();
    let mut reason = None;

    match resolved {
        None => {
            next.archive();
            reason = Some(ArchiveReason::Missing);
        }
        Some(resolved) => {
            next.status = resolved.status;
            next.chat_handle = resolved.chat_handle.clone();
            next.scheduled_at = resolved.scheduled_at;
            if next.status == VideoStatus::Archived {
                reason = Some(ArchiveReason::Finished);
            }
        }
    }

    // A limit past the representable range never expires.
    if next.status == VideoStatus::Upcoming
        && next
            .scheduled_at
            .and_then(|scheduled_at| scheduled_at.checked_add_signed(stale_after))
            .is_some_and(|limit| limit < now)
    {
        next.archive();
        reason = Some(ArchiveReason::Stale);
    }

    (next != *video).then_some((next, reason))
}

/// Refreshes persisted upcoming videos against the metadata source.
pub struct UpcomingRefresher {
    videos: Arc<dyn VideoRepository>,
    metadata: Arc<dyn MetadataSource>,
    stale_after: Duration,
}

impl UpcomingRefresher {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        metadata: Arc<dyn MetadataSource>,
        stale_after: Duration,
    ) -> Self {
        Self {
            videos,
            metadata,
            stale_after,
        }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<RefreshOutcome> {
        let upcoming = self.videos.list_by_status(VideoStatus::Upcoming).await?;
        let mut outcome = RefreshOutcome {
            checked: upcoming.len(),
            ..Default::default()
        };
        if upcoming.is_empty() {
            return Ok(outcome);
        }

        let source_ids: Vec<String> = upcoming.iter().map(|v| v.source_id.clone()).collect();
        let resolution = resolve_all(self.metadata.as_ref(), &source_ids).await?;
        let rejected: HashSet<&str> = resolution.rejected.iter().map(String::as_str).collect();
        let resolved: HashMap<&str, &ResolvedVideo> = resolution
            .resolved
            .iter()
            .map(|r| (r.source_id.as_str(), r))
            .collect();

        for video in &upcoming {
            // Returned but unclassifiable: leave as is until the next refresh.
            if rejected.contains(video.source_id.as_str()) {
                continue;
            }

            let Some((next, reason)) = plan_refresh(
                video,
                resolved.get(video.source_id.as_str()).copied(),
                now,
                self.stale_after,
            ) else {
                continue;
            };

            if next.status != video.status || next.chat_handle != video.chat_handle {
                self.videos
                    .update_status(&next.source_id, next.status, &next.chat_handle)
                    .await?;
            }
            if next.scheduled_at != video.scheduled_at {
                self.videos
                    .update_scheduled_at(&next.source_id, next.scheduled_at)
                    .await?;
            }

            match reason {
                Some(reason) => {
                    info!(source_id = %next.source_id, %reason, "Archived upcoming video");
                    outcome.archived += 1;
                }
                None => {
                    debug!(
                        source_id = %next.source_id,
                        status = %next.status,
                        "Refreshed upcoming video"
                    );
                    outcome.updated += 1;
                }
            }
        }

        Ok(outcome)
    }
}
