//! Domain types shared by the reconciler, the chat ingester and the
//! persistence layer.

pub mod chat;
pub mod video;

pub use chat::{ChatMessage, ChatRecord, ChatTarget, FetchHistoryEntry};
pub use video::{FeedAnnouncement, LiveStreamingDetails, Video, VideoMetadata, VideoStatus};
