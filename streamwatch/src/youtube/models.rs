//! Data API v3 response shapes (only the fields we read).

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoItem {
    pub id: String,
    pub snippet: Option<VideoSnippet>,
    pub live_streaming_details: Option<LiveStreamingDetailsJson>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoSnippet {
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub live_broadcast_content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LiveStreamingDetailsJson {
    pub active_live_chat_id: Option<String>,
    pub scheduled_start_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatItem {
    pub snippet: ChatSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatSnippet {
    #[serde(default)]
    pub author_channel_id: String,
    #[serde(default)]
    pub display_message: String,
    #[serde(default)]
    pub published_at: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub reason: String,
}
