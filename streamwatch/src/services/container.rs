//! Builds the sync service and its collaborators from configuration.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use sentiment::{GoogleLanguageProvider, NegativityClassifier};

use crate::Result;
use crate::chat::{ChatFilter, ChatIngester, FetchPrioritySelector};
use crate::config::AppConfig;
use crate::database::DbPool;
use crate::database::repositories::{
    SqlxChatRecordRepository, SqlxFetchHistoryRepository, SqlxVideoRepository,
};
use crate::reconcile::{Reconciler, UpcomingRefresher};
use crate::sync::{SyncService, SyncSettings};
use crate::utils::http_client::build_http_client;
use crate::youtube::{YouTubeDataClient, YouTubeFeedClient};

/// Owns the wired application services.
pub struct ServiceContainer {
    /// Database connection pool.
    pub pool: DbPool,
    pub sync: Arc<SyncService>,
}

impl ServiceContainer {
    pub fn new(config: &AppConfig, pool: DbPool) -> Result<Self> {
        info!("Initializing service container");

        let client = build_http_client(config.http_timeout)?;

        let videos = Arc::new(SqlxVideoRepository::new(pool.clone()));
        let chats = Arc::new(SqlxChatRecordRepository::new(pool.clone()));
        let history = Arc::new(SqlxFetchHistoryRepository::new(pool.clone()));

        let feed = Arc::new(YouTubeFeedClient::new(
            client.clone(),
            config.feed_base_url.clone(),
        ));
        let data = Arc::new(YouTubeDataClient::new(
            client.clone(),
            config.api_base_url.clone(),
            config.youtube_api_key.clone(),
        ));
        let provider = Arc::new(GoogleLanguageProvider::with_base_url(
            client,
            config.sentiment_base_url.clone(),
            config.sentiment_api_key.clone(),
        ));

        let allowlist: HashSet<String> = config.chat_author_allowlist.iter().cloned().collect();

        let sync = SyncService::new(
            Reconciler::new(
                videos.clone(),
                feed,
                data.clone(),
                config.target_channel_ids.clone(),
            ),
            UpcomingRefresher::new(videos.clone(), data.clone(), config.upcoming_stale_after),
            FetchPrioritySelector::new(history.clone()),
            ChatIngester::new(
                data,
                ChatFilter::new(chats.clone(), allowlist),
                NegativityClassifier::new(provider),
                videos.clone(),
                chats,
                history,
                config.chat_max_results,
            ),
            videos,
            SyncSettings {
                deadline: config.sync_deadline,
                pause_chat_while_live: config.pause_chat_while_live,
                static_target: config.static_target.clone(),
            },
        );

        info!(
            channels = config.target_channel_ids.len(),
            allowlist = config.chat_author_allowlist.len(),
            static_target = config.static_target.is_some(),
            "Service container initialized"
        );

        Ok(Self {
            pool,
            sync: Arc::new(sync),
        })
    }
}
