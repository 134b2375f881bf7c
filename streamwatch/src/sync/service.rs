//! Sync orchestration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use super::SyncReport;
use crate::chat::{ChatIngester, FetchPrioritySelector, TargetKind};
use crate::database::repositories::VideoRepository;
use crate::domain::{ChatTarget, VideoStatus};
use crate::reconcile::{Reconciler, UpcomingRefresher};
use crate::{Error, Result};

/// Default deadline for a whole run.
pub const DEFAULT_SYNC_DEADLINE: Duration = Duration::from_secs(60);

/// Per-run switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Re-check persisted upcoming videos before chat selection.
    pub refresh_upcoming: bool,
}

/// Static behaviour of the service.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub deadline: Duration,
    /// Skip chat ingestion entirely while any tracked video is live.
    pub pause_chat_while_live: bool,
    /// Additional target polled every run.
    pub static_target: Option<ChatTarget>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_SYNC_DEADLINE,
            pause_chat_while_live: false,
            static_target: None,
        }
    }
}

/// Runs the full pipeline for one invocation.
pub struct SyncService {
    reconciler: Reconciler,
    refresher: UpcomingRefresher,
    selector: FetchPrioritySelector,
    ingester: ChatIngester,
    videos: Arc<dyn VideoRepository>,
    settings: SyncSettings,
}

impl SyncService {
    pub fn new(
        reconciler: Reconciler,
        refresher: UpcomingRefresher,
        selector: FetchPrioritySelector,
        ingester: ChatIngester,
        videos: Arc<dyn VideoRepository>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            reconciler,
            refresher,
            selector,
            ingester,
            videos,
            settings,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Run once under the configured deadline.
    ///
    /// Work already committed when the deadline fires stays committed; the
    /// next run picks up from the stored watermarks.
    pub async fn run(&self, options: SyncOptions) -> Result<SyncReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("sync_run", %run_id);
        let deadline = self.settings.deadline;

        tokio::time::timeout(deadline, self.run_inner(run_id, options).instrument(span))
            .await
            .map_err(|_| Error::DeadlineExceeded(deadline))?
    }

    async fn run_inner(&self, run_id: Uuid, options: SyncOptions) -> Result<SyncReport> {
        let started = Instant::now();
        let mut report = SyncReport::new(run_id);

        report.reconcile = self.reconciler.run().await?;

        if options.refresh_upcoming {
            report.refresh = Some(self.refresher.run(Utc::now()).await?);
        }

        if self.settings.pause_chat_while_live
            && !self.videos.list_by_status(VideoStatus::Live).await?.is_empty()
        {
            info!("A tracked video is live, chat ingestion paused");
            report.chat_paused = true;
            return Ok(finish(report, started));
        }

        if let Some(target) = &self.settings.static_target {
            report.static_chat = Some(self.ingester.ingest(target, TargetKind::Static).await?);
        }

        let candidates = self.videos.list_by_status(VideoStatus::Upcoming).await?;
        match self.selector.select(&candidates).await? {
            Some(video) => {
                let target = ChatTarget {
                    source_id: video.source_id.clone(),
                    chat_handle: video.chat_handle.clone(),
                };
                report.selected_source_id = Some(video.source_id);
                report.chat = Some(self.ingester.ingest(&target, TargetKind::Tracked).await?);
            }
            None => debug!("No upcoming video to poll"),
        }

        Ok(finish(report, started))
    }
}

fn finish(mut report: SyncReport, started: Instant) -> SyncReport {
    report.elapsed_ms = started.elapsed().as_millis() as u64;
    info!(
        new_videos = report.reconcile.new_videos,
        updated_videos = report.reconcile.updated_videos,
        selected = report.selected_source_id.as_deref().unwrap_or("-"),
        persisted_chats = report.persisted_chats(),
        elapsed_ms = report.elapsed_ms,
        "Sync run finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FetchHistoryEntry;
    use crate::testing::{
        Fakes, StaticFeed, announcement, at, chat_message, metadata, upcoming_video,
    };
    use crate::youtube::ChatFetch;
    use async_trait::async_trait;

    fn service(fakes: &Fakes, settings: SyncSettings) -> SyncService {
        fakes.sync_service(settings)
    }

    fn fakes_with_feed(feed: StaticFeed) -> Fakes {
        Fakes {
            feed: Arc::new(feed),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_reconciles_then_polls_new_upcoming_video() {
        let fakes = fakes_with_feed(StaticFeed::with("UC1", vec![announcement("abc", 10)]));
        fakes
            .metadata
            .items
            .lock()
            .insert("abc".to_string(), metadata("abc", "upcoming"));
        fakes.chat.respond(
            "chat-abc",
            ChatFetch::Messages(vec![chat_message("abc", "UC1", "hello", 20)]),
        );

        let report = service(&fakes, SyncSettings::default())
            .run(SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(report.reconcile.new_videos, 1);
        assert_eq!(report.selected_source_id.as_deref(), Some("abc"));
        assert_eq!(report.persisted_chats(), 1);
        assert!(report.refresh.is_none());
        assert_eq!(fakes.videos.get("abc").unwrap().status, VideoStatus::Upcoming);
    }

    #[tokio::test]
    async fn test_run_without_candidates_polls_nothing() {
        let fakes = Fakes::default();

        let report = service(&fakes, SyncSettings::default())
            .run(SyncOptions::default())
            .await
            .unwrap();

        assert!(report.selected_source_id.is_none());
        assert!(report.chat.is_none());
        assert!(fakes.chat.polled.lock().is_empty());
    }

    #[tokio::test]
    async fn test_run_prefers_least_recently_polled() {
        let fakes = Fakes::default();
        fakes
            .videos
            .videos
            .lock()
            .extend([upcoming_video("a"), upcoming_video("b")]);
        fakes.history.entries.lock().push(FetchHistoryEntry {
            source_id: "a".to_string(),
            fetched_at: at(5),
        });

        let report = service(&fakes, SyncSettings::default())
            .run(SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(report.selected_source_id.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_live_video_pauses_chat() {
        let fakes = Fakes::default();
        let mut live = upcoming_video("live");
        live.status = VideoStatus::Live;
        fakes
            .videos
            .videos
            .lock()
            .extend([live, upcoming_video("abc")]);
        let settings = SyncSettings {
            pause_chat_while_live: true,
            static_target: Some(ChatTarget {
                source_id: "static".to_string(),
                chat_handle: "chat-static".to_string(),
            }),
            ..Default::default()
        };

        let report = service(&fakes, settings).run(SyncOptions::default()).await.unwrap();

        assert!(report.chat_paused);
        assert!(report.static_chat.is_none());
        assert!(fakes.chat.polled.lock().is_empty());
    }

    #[tokio::test]
    async fn test_static_target_polled_before_tracked() {
        let fakes = Fakes::default();
        fakes.videos.videos.lock().push(upcoming_video("abc"));
        let settings = SyncSettings {
            static_target: Some(ChatTarget {
                source_id: "static".to_string(),
                chat_handle: "chat-static".to_string(),
            }),
            ..Default::default()
        };

        let report = service(&fakes, settings).run(SyncOptions::default()).await.unwrap();

        assert!(report.static_chat.is_some());
        assert_eq!(
            fakes.chat.polled.lock().as_slice(),
            ["static".to_string(), "abc".to_string()]
        );
        let history = fakes.history.entries.lock();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].source_id, "abc");
    }

    #[tokio::test]
    async fn test_refresh_archives_before_selection() {
        let fakes = Fakes::default();
        fakes.videos.videos.lock().push(upcoming_video("gone"));

        let report = service(&fakes, SyncSettings::default())
            .run(SyncOptions {
                refresh_upcoming: true,
            })
            .await
            .unwrap();

        let refresh = report.refresh.unwrap();
        assert_eq!(refresh.checked, 1);
        assert_eq!(refresh.archived, 1);
        assert!(report.selected_source_id.is_none());
        assert_eq!(fakes.videos.get("gone").unwrap().status, VideoStatus::Archived);
    }

    #[tokio::test]
    async fn test_feed_failure_aborts_run() {
        let fakes = fakes_with_feed(StaticFeed {
            fail: true,
            ..Default::default()
        });
        fakes.videos.videos.lock().push(upcoming_video("abc"));

        let err = service(&fakes, SyncSettings::default())
            .run(SyncOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Upstream { .. }));
        assert!(fakes.chat.polled.lock().is_empty());
    }

    struct StalledFeed;

    #[async_trait]
    impl crate::youtube::FeedSource for StalledFeed {
        async fn fetch_announcements(
            &self,
            _channel_id: &str,
            _watermark: chrono::DateTime<Utc>,
        ) -> Result<Vec<crate::domain::FeedAnnouncement>> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let fakes = Fakes::default();
        let mut service = service(&fakes, SyncSettings::default());
        service.reconciler = Reconciler::new(
            fakes.videos.clone(),
            Arc::new(StalledFeed),
            fakes.metadata.clone(),
            vec!["UC1".to_string()],
        );
        service.settings.deadline = Duration::from_secs(5);

        let err = service.run(SyncOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::DeadlineExceeded(d) if d == Duration::from_secs(5)));
    }
}
