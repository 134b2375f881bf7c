//! Data API v3 client: `videos.list` and `liveChatMessages.list`.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::models::{ChatItem, ErrorEnvelope, ListResponse, VideoItem};
use super::{ChatFetch, ChatSource, MAX_METADATA_BATCH, MetadataSource};
use crate::database::time::parse_rfc3339;
use crate::domain::{ChatMessage, ChatTarget, LiveStreamingDetails, VideoMetadata};
use crate::{Error, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Error reason reported when a live chat will never produce messages again.
const LIVE_CHAT_ENDED_REASON: &str = "liveChatEnded";

/// Data API v3 client authenticated by API key.
#[derive(Debug, Clone)]
pub struct YouTubeDataClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl YouTubeDataClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn read_list<T: DeserializeOwned>(
        &self,
        service: &str,
        response: Response,
    ) -> Result<ListResponse<T>> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::upstream(
                service,
                format!("{}: {}", status, error_message(&body)),
            ));
        }
        serde_json::from_str(&body)
            .map_err(|e| Error::upstream(service, format!("malformed response: {}", e)))
    }
}

fn decode_error(body: &str) -> Option<ErrorEnvelope> {
    serde_json::from_str(body).ok()
}

fn error_message(body: &str) -> String {
    decode_error(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|| body.to_string())
}

/// Whether an error body carries the `liveChatEnded` reason.
pub(crate) fn is_chat_ended(body: &str) -> bool {
    decode_error(body).is_some_and(|envelope| {
        envelope
            .error
            .errors
            .iter()
            .any(|detail| detail.reason == LIVE_CHAT_ENDED_REASON)
    })
}

fn metadata_from_item(item: VideoItem) -> VideoMetadata {
    let (published_at, broadcast_label) = item
        .snippet
        .map(|s| (s.published_at, s.live_broadcast_content))
        .unwrap_or_default();

    VideoMetadata {
        source_id: item.id,
        broadcast_label,
        published_at,
        live_details: item.live_streaming_details.map(|d| LiveStreamingDetails {
            chat_handle: d.active_live_chat_id.filter(|id| !id.is_empty()),
            scheduled_start: d.scheduled_start_time,
        }),
    }
}

/// Convert chat items, dropping those with unparseable timestamps.
fn messages_from_items(source_id: &str, items: Vec<ChatItem>) -> Vec<ChatMessage> {
    items
        .into_iter()
        .filter_map(|item| match parse_rfc3339(&item.snippet.published_at) {
            Ok(published_at) => Some(ChatMessage {
                author_channel_id: item.snippet.author_channel_id,
                message: item.snippet.display_message,
                published_at,
                source_id: source_id.to_string(),
            }),
            Err(e) => {
                warn!(source_id, "Skipping chat message: {}", e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl MetadataSource for YouTubeDataClient {
    async fn fetch_metadata(&self, source_ids: &[String]) -> Result<Vec<VideoMetadata>> {
        if source_ids.is_empty() {
            return Ok(Vec::new());
        }
        if source_ids.len() > MAX_METADATA_BATCH {
            return Err(Error::Other(format!(
                "metadata lookup of {} ids exceeds the limit of {}",
                source_ids.len(),
                MAX_METADATA_BATCH
            )));
        }

        let ids = source_ids.join(",");
        let max_results = MAX_METADATA_BATCH.to_string();
        let response = self
            .client
            .get(format!("{}/videos", self.base_url))
            .query(&[
                ("part", "snippet,liveStreamingDetails"),
                ("id", ids.as_str()),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let list: ListResponse<VideoItem> = self.read_list("metadata", response).await?;
        debug!(
            requested = source_ids.len(),
            resolved = list.items.len(),
            "Fetched video metadata"
        );
        Ok(list.items.into_iter().map(metadata_from_item).collect())
    }
}

#[async_trait]
impl ChatSource for YouTubeDataClient {
    async fn fetch_messages(
        &self,
        target: &ChatTarget,
        max_results: Option<u32>,
    ) -> Result<ChatFetch> {
        let mut request = self
            .client
            .get(format!("{}/liveChat/messages", self.base_url))
            .query(&[
                ("liveChatId", target.chat_handle.as_str()),
                ("part", "snippet"),
                ("key", self.api_key.as_str()),
            ]);
        if let Some(max) = max_results.filter(|max| *max > 0) {
            request = request.query(&[("maxResults", max)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            if is_chat_ended(&body) {
                debug!(source_id = %target.source_id, "Live chat has ended");
                return Ok(ChatFetch::Ended);
            }
            return Err(Error::upstream(
                "chat",
                format!(
                    "{} for {}: {}",
                    status,
                    target.source_id,
                    error_message(&body)
                ),
            ));
        }

        let body = response.text().await?;
        let list: ListResponse<ChatItem> = serde_json::from_str(&body)
            .map_err(|e| Error::upstream("chat", format!("malformed response: {}", e)))?;
        Ok(ChatFetch::Messages(messages_from_items(
            &target.source_id,
            list.items,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_chat_ended() {
        let ended = r#"{"error":{"code":403,"message":"The live chat is no longer live.",
            "errors":[{"message":"The live chat is no longer live.","domain":"youtube.liveChat","reason":"liveChatEnded"}]}}"#;
        assert!(is_chat_ended(ended));

        let quota = r#"{"error":{"code":403,"message":"quota",
            "errors":[{"domain":"youtube.quota","reason":"quotaExceeded"}]}}"#;
        assert!(!is_chat_ended(quota));
        assert_eq!(error_message(quota), "quota");

        // Matching is on the decoded reason, never on message text.
        assert!(!is_chat_ended("liveChatEnded"));
    }

    #[test]
    fn test_metadata_from_items() {
        let body = r#"{"items":[
            {"id":"abc","snippet":{"publishedAt":"2029-12-01T00:00:00Z","liveBroadcastContent":"upcoming"},
             "liveStreamingDetails":{"scheduledStartTime":"2030-01-01T00:00:00Z","activeLiveChatId":"chat-abc"}},
            {"id":"plain","snippet":{"publishedAt":"2029-12-01T00:00:00Z","liveBroadcastContent":"none"}}
        ]}"#;
        let list: ListResponse<VideoItem> = serde_json::from_str(body).unwrap();
        let metadata: Vec<_> = list.items.into_iter().map(metadata_from_item).collect();

        assert_eq!(metadata[0].source_id, "abc");
        assert_eq!(metadata[0].broadcast_label, "upcoming");
        let details = metadata[0].live_details.as_ref().unwrap();
        assert_eq!(details.chat_handle.as_deref(), Some("chat-abc"));
        assert_eq!(
            details.scheduled_start.as_deref(),
            Some("2030-01-01T00:00:00Z")
        );

        assert_eq!(metadata[1].broadcast_label, "none");
        assert!(metadata[1].live_details.is_none());
    }

    #[test]
    fn test_messages_skip_bad_timestamps() {
        let body = r#"{"items":[
            {"snippet":{"authorChannelId":"UC1","displayMessage":"hi","publishedAt":"2030-01-01T00:00:01Z"}},
            {"snippet":{"authorChannelId":"UC1","displayMessage":"broken","publishedAt":""}},
            {"snippet":{"authorChannelId":"UC2","displayMessage":"yo","publishedAt":"2030-01-01T00:00:02Z"}}
        ]}"#;
        let list: ListResponse<ChatItem> = serde_json::from_str(body).unwrap();
        let messages = messages_from_items("abc", list.items);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].message, "hi");
        assert_eq!(messages[1].author_channel_id, "UC2");
        assert!(messages.iter().all(|m| m.source_id == "abc"));
    }

    #[test]
    fn test_empty_list_response() {
        let list: ListResponse<ChatItem> = serde_json::from_str("{}").unwrap();
        assert!(list.items.is_empty());
    }
}
