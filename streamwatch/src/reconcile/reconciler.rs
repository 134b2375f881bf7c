//! Feed/metadata reconciler.
//!
//! Merges feed announcements with resolved metadata into canonical videos,
//! then inserts the new ones and upserts the known ones.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{ResolvedVideo, resolve_all};
use crate::Result;
use crate::database::repositories::VideoRepository;
use crate::domain::{FeedAnnouncement, Video};
use crate::youtube::{FeedSource, MetadataSource};

/// Counts for one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub announcements: usize,
    pub new_videos: usize,
    pub updated_videos: usize,
    /// Items dropped by classification, merge or validation.
    pub skipped: usize,
}

/// Result of merging announcements with resolved metadata.
#[derive(Debug, Default)]
pub struct Merged {
    pub videos: Vec<Video>,
    /// Resolved items with no matching announcement.
    pub unmatched: Vec<String>,
    /// Merged items that violated a `Video` invariant.
    pub invalid: Vec<String>,
}

/// Combine announcements and resolved metadata.
///
/// Text fields, channel and `updated_at` come from the announcement; status,
/// chat handle and instants come from the metadata. The output follows the
/// metadata order.
pub fn merge_announcements(
    announcements: &[FeedAnnouncement],
    resolved: Vec<ResolvedVideo>,
) -> Merged {
    let by_source: HashMap<&str, &FeedAnnouncement> = announcements
        .iter()
        .map(|a| (a.source_id.as_str(), a))
        .collect();

    if resolved.len() != by_source.len() {
        warn!(
            announcements = by_source.len(),
            resolved = resolved.len(),
            "Metadata count differs from announcement count, continuing with the intersection"
        );
    }

    let mut merged = Merged::default();
    for item in resolved {
        let Some(announcement) = by_source.get(item.source_id.as_str()) else {
            warn!(source_id = %item.source_id, "Resolved video has no matching announcement");
            merged.unmatched.push(item.source_id);
            continue;
        };

        let video = Video {
            channel_id: announcement.channel_id.clone(),
            source_id: item.source_id,
            title: announcement.title.clone(),
            description: announcement.description.clone(),
            chat_handle: item.chat_handle,
            status: item.status,
            published_at: item.published_at,
            scheduled_at: item.scheduled_at,
            updated_at: announcement.updated_at,
        };

        match video.validate() {
            Ok(()) => merged.videos.push(video),
            Err(e) => {
                warn!(source_id = %video.source_id, "Skipping merged video: {}", e);
                merged.invalid.push(video.source_id);
            }
        }
    }
    merged
}

/// Split videos into `(new, updated)` by whether their source id is known.
pub fn partition_videos(videos: Vec<Video>, known: &HashSet<String>) -> (Vec<Video>, Vec<Video>) {
    videos
        .into_iter()
        .partition(|video| !known.contains(&video.source_id))
}

/// Runs one reconciliation pass over the configured channels.
pub struct Reconciler {
    videos: Arc<dyn VideoRepository>,
    feed: Arc<dyn FeedSource>,
    metadata: Arc<dyn MetadataSource>,
    channel_ids: Vec<String>,
}

impl Reconciler {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        feed: Arc<dyn FeedSource>,
        metadata: Arc<dyn MetadataSource>,
        channel_ids: Vec<String>,
    ) -> Self {
        Self {
            videos,
            feed,
            metadata,
            channel_ids,
        }
    }

    /// Fetch announcements newer than the stored watermark and persist the
    /// merged videos.
    pub async fn run(&self) -> Result<ReconcileOutcome> {
        let watermark = self
            .videos
            .latest_updated_at()
            .await?
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        let mut announcements = Vec::new();
        for channel_id in &self.channel_ids {
            announcements.extend(self.feed.fetch_announcements(channel_id, watermark).await?);
        }
        self.reconcile(announcements).await
    }

    /// Reconcile an explicit batch of announcements.
    pub async fn reconcile(&self, announcements: Vec<FeedAnnouncement>) -> Result<ReconcileOutcome> {
        let mut outcome = ReconcileOutcome {
            announcements: announcements.len(),
            ..Default::default()
        };
        if announcements.is_empty() {
            debug!("No new announcements");
            return Ok(outcome);
        }

        let mut source_ids: Vec<String> = Vec::with_capacity(announcements.len());
        let mut seen = HashSet::new();
        for announcement in &announcements {
            if seen.insert(announcement.source_id.as_str()) {
                source_ids.push(announcement.source_id.clone());
            }
        }

        let resolution = resolve_all(self.metadata.as_ref(), &source_ids).await?;
        let merged = merge_announcements(&announcements, resolution.resolved);
        outcome.skipped = resolution.rejected.len() + merged.unmatched.len() + merged.invalid.len();

        if merged.videos.is_empty() {
            debug!("Nothing to persist after merge");
            return Ok(outcome);
        }

        let merged_ids: Vec<String> = merged.videos.iter().map(|v| v.source_id.clone()).collect();
        let known: HashSet<String> = self
            .videos
            .find_by_source_ids(&merged_ids)
            .await?
            .into_iter()
            .map(|v| v.source_id)
            .collect();

        let (new_videos, updated_videos) = partition_videos(merged.videos, &known);
        self.videos.insert_videos(&new_videos).await?;
        self.videos.upsert_videos(&updated_videos).await?;

        outcome.new_videos = new_videos.len();
        outcome.updated_videos = updated_videos.len();
        info!(
            announcements = outcome.announcements,
            new = outcome.new_videos,
            updated = outcome.updated_videos,
            skipped = outcome.skipped,
            "Reconciled feed"
        );
        Ok(outcome)
    }
}
