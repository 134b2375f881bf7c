//! In-memory fakes for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use sentiment::{SentimentError, SentimentProvider, SentimentScore};

use crate::chat::{ChatFilter, ChatIngester, FetchPrioritySelector};
use crate::database::repositories::{
    ChatRecordRepository, FetchHistoryRepository, VideoRepository,
};
use crate::domain::{
    ChatMessage, ChatRecord, ChatTarget, FeedAnnouncement, FetchHistoryEntry,
    LiveStreamingDetails, Video, VideoMetadata, VideoStatus,
};
use crate::reconcile::{Reconciler, UpcomingRefresher};
use crate::sync::{SyncService, SyncSettings};
use crate::youtube::{ChatFetch, ChatSource, FeedSource, MetadataSource};
use crate::{Error, Result};

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_900_000_000 + secs, 0).unwrap()
}

pub fn rfc3339(secs: i64) -> String {
    at(secs).to_rfc3339()
}

pub fn upcoming_video(source_id: &str) -> Video {
    Video {
        channel_id: "UC1".to_string(),
        source_id: source_id.to_string(),
        title: format!("title {}", source_id),
        description: String::new(),
        chat_handle: format!("chat-{}", source_id),
        status: VideoStatus::Upcoming,
        published_at: at(0),
        scheduled_at: Some(at(1_000)),
        updated_at: at(0),
    }
}

pub fn announcement(source_id: &str, updated_secs: i64) -> FeedAnnouncement {
    FeedAnnouncement {
        channel_id: "UC1".to_string(),
        source_id: source_id.to_string(),
        title: format!("title {}", source_id),
        description: "desc".to_string(),
        published_at: at(0),
        updated_at: at(updated_secs),
    }
}

pub fn metadata(source_id: &str, label: &str) -> VideoMetadata {
    let live_details = matches!(label, "live" | "upcoming").then(|| LiveStreamingDetails {
        chat_handle: Some(format!("chat-{}", source_id)),
        scheduled_start: Some(rfc3339(1_000)),
    });
    VideoMetadata {
        source_id: source_id.to_string(),
        broadcast_label: label.to_string(),
        published_at: rfc3339(0),
        live_details,
    }
}

pub fn chat_message(source_id: &str, author: &str, text: &str, secs: i64) -> ChatMessage {
    ChatMessage {
        author_channel_id: author.to_string(),
        message: text.to_string(),
        published_at: at(secs),
        source_id: source_id.to_string(),
    }
}

#[derive(Default)]
pub struct MemoryVideoRepository {
    pub videos: Mutex<Vec<Video>>,
}

impl MemoryVideoRepository {
    pub fn with(videos: Vec<Video>) -> Self {
        Self {
            videos: Mutex::new(videos),
        }
    }

    pub fn get(&self, source_id: &str) -> Option<Video> {
        self.videos
            .lock()
            .iter()
            .find(|v| v.source_id == source_id)
            .cloned()
    }
}

#[async_trait]
impl VideoRepository for MemoryVideoRepository {
    async fn find_by_source_ids(&self, source_ids: &[String]) -> Result<Vec<Video>> {
        Ok(self
            .videos
            .lock()
            .iter()
            .filter(|v| source_ids.contains(&v.source_id))
            .cloned()
            .collect())
    }

    async fn list_by_status(&self, status: VideoStatus) -> Result<Vec<Video>> {
        Ok(self
            .videos
            .lock()
            .iter()
            .filter(|v| v.status == status)
            .cloned()
            .collect())
    }

    async fn insert_videos(&self, videos: &[Video]) -> Result<u64> {
        let mut stored = self.videos.lock();
        for video in videos {
            if stored.iter().any(|v| v.source_id == video.source_id) {
                return Err(Error::Other(format!("duplicate {}", video.source_id)));
            }
            stored.push(video.clone());
        }
        Ok(videos.len() as u64)
    }

    async fn upsert_videos(&self, videos: &[Video]) -> Result<u64> {
        let mut stored = self.videos.lock();
        for video in videos {
            match stored.iter_mut().find(|v| v.source_id == video.source_id) {
                Some(existing) => *existing = video.clone(),
                None => stored.push(video.clone()),
            }
        }
        Ok(videos.len() as u64)
    }

    async fn latest_updated_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.videos.lock().iter().map(|v| v.updated_at).max())
    }

    async fn update_status(
        &self,
        source_id: &str,
        status: VideoStatus,
        chat_handle: &str,
    ) -> Result<()> {
        if let Some(video) = self
            .videos
            .lock()
            .iter_mut()
            .find(|v| v.source_id == source_id)
        {
            video.status = status;
            video.chat_handle = chat_handle.to_string();
        }
        Ok(())
    }

    async fn update_scheduled_at(
        &self,
        source_id: &str,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        if let Some(video) = self
            .videos
            .lock()
            .iter_mut()
            .find(|v| v.source_id == source_id)
        {
            video.scheduled_at = scheduled_at;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryChatRepository {
    pub records: Mutex<Vec<ChatRecord>>,
}

#[async_trait]
impl ChatRecordRepository for MemoryChatRepository {
    async fn insert_chat_records(&self, records: &[ChatRecord]) -> Result<u64> {
        self.records.lock().extend_from_slice(records);
        Ok(records.len() as u64)
    }

    async fn latest_published_at(&self, source_id: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|r| r.source_id == source_id)
            .map(|r| r.published_at)
            .max())
    }

    async fn list_by_source_id(&self, source_id: &str) -> Result<Vec<ChatRecord>> {
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|r| r.source_id == source_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryHistoryRepository {
    pub entries: Mutex<Vec<FetchHistoryEntry>>,
}

#[async_trait]
impl FetchHistoryRepository for MemoryHistoryRepository {
    async fn insert_fetch_history(&self, entry: &FetchHistoryEntry) -> Result<()> {
        self.entries.lock().push(entry.clone());
        Ok(())
    }

    async fn find_by_source_ids(&self, source_ids: &[String]) -> Result<Vec<FetchHistoryEntry>> {
        Ok(self
            .entries
            .lock()
            .iter()
            .filter(|e| source_ids.contains(&e.source_id))
            .cloned()
            .collect())
    }
}

/// Feed returning fixed announcements per channel, honoring the watermark.
#[derive(Default)]
pub struct StaticFeed {
    pub by_channel: Mutex<HashMap<String, Vec<FeedAnnouncement>>>,
    pub fail: bool,
}

impl StaticFeed {
    pub fn with(channel_id: &str, announcements: Vec<FeedAnnouncement>) -> Self {
        Self {
            by_channel: Mutex::new(HashMap::from([(channel_id.to_string(), announcements)])),
            fail: false,
        }
    }
}

#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch_announcements(
        &self,
        channel_id: &str,
        watermark: DateTime<Utc>,
    ) -> Result<Vec<FeedAnnouncement>> {
        if self.fail {
            return Err(Error::upstream("feed", "503 Service Unavailable"));
        }
        Ok(self
            .by_channel
            .lock()
            .get(channel_id)
            .map(|items| {
                items
                    .iter()
                    .filter(|a| a.updated_at > watermark)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Metadata source backed by a map; records the size of each lookup.
#[derive(Default)]
pub struct StaticMetadata {
    pub items: Mutex<HashMap<String, VideoMetadata>>,
    pub batch_sizes: Mutex<Vec<usize>>,
}

impl StaticMetadata {
    pub fn with(items: Vec<VideoMetadata>) -> Self {
        Self {
            items: Mutex::new(
                items
                    .into_iter()
                    .map(|m| (m.source_id.clone(), m))
                    .collect(),
            ),
            batch_sizes: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MetadataSource for StaticMetadata {
    async fn fetch_metadata(&self, source_ids: &[String]) -> Result<Vec<VideoMetadata>> {
        self.batch_sizes.lock().push(source_ids.len());
        let items = self.items.lock();
        Ok(source_ids
            .iter()
            .filter_map(|id| items.get(id).cloned())
            .collect())
    }
}

/// Chat source returning a scripted response per chat handle.
#[derive(Default)]
pub struct ScriptedChat {
    pub responses: Mutex<HashMap<String, ChatFetch>>,
    pub polled: Mutex<Vec<String>>,
}

impl ScriptedChat {
    pub fn respond(&self, chat_handle: &str, fetch: ChatFetch) {
        self.responses.lock().insert(chat_handle.to_string(), fetch);
    }
}

#[async_trait]
impl ChatSource for ScriptedChat {
    async fn fetch_messages(
        &self,
        target: &ChatTarget,
        _max_results: Option<u32>,
    ) -> Result<ChatFetch> {
        self.polled.lock().push(target.source_id.clone());
        Ok(self
            .responses
            .lock()
            .get(&target.chat_handle)
            .cloned()
            .unwrap_or(ChatFetch::Messages(Vec::new())))
    }
}

/// Scores text containing "bad" as negative and fails on "fail".
#[derive(Default)]
pub struct KeywordSentiment {
    pub analyzed: Mutex<Vec<String>>,
}

#[async_trait]
impl SentimentProvider for KeywordSentiment {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn analyze(&self, text: &str) -> sentiment::Result<SentimentScore> {
        self.analyzed.lock().push(text.to_string());
        if text.contains("fail") {
            return Err(SentimentError::service(500, "boom"));
        }
        if text.contains("bad") {
            Ok(SentimentScore::new(-0.6, 0.8))
        } else {
            Ok(SentimentScore::new(0.7, 0.7))
        }
    }
}

/// Fakes wired together.
pub struct Fakes {
    pub videos: Arc<MemoryVideoRepository>,
    pub chats: Arc<MemoryChatRepository>,
    pub history: Arc<MemoryHistoryRepository>,
    pub feed: Arc<StaticFeed>,
    pub metadata: Arc<StaticMetadata>,
    pub chat: Arc<ScriptedChat>,
    pub sentiment: Arc<KeywordSentiment>,
}

impl Default for Fakes {
    fn default() -> Self {
        Self {
            videos: Arc::new(MemoryVideoRepository::default()),
            chats: Arc::new(MemoryChatRepository::default()),
            history: Arc::new(MemoryHistoryRepository::default()),
            feed: Arc::new(StaticFeed::default()),
            metadata: Arc::new(StaticMetadata::default()),
            chat: Arc::new(ScriptedChat::default()),
            sentiment: Arc::new(KeywordSentiment::default()),
        }
    }
}

impl Fakes {
    /// A service over these fakes watching `UC1`, which is also the only
    /// allowed chat author.
    pub fn sync_service(&self, settings: SyncSettings) -> SyncService {
        let allowlist: HashSet<String> = ["UC1".to_string()].into();
        SyncService::new(
            Reconciler::new(
                self.videos.clone(),
                self.feed.clone(),
                self.metadata.clone(),
                vec!["UC1".to_string()],
            ),
            UpcomingRefresher::new(
                self.videos.clone(),
                self.metadata.clone(),
                chrono::Duration::hours(72),
            ),
            FetchPrioritySelector::new(self.history.clone()),
            ChatIngester::new(
                self.chat.clone(),
                ChatFilter::new(self.chats.clone(), allowlist),
                sentiment::NegativityClassifier::new(self.sentiment.clone()),
                self.videos.clone(),
                self.chats.clone(),
                self.history.clone(),
                None,
            ),
            self.videos.clone(),
            settings,
        )
    }
}
