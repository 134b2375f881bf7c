//! Broadcast-content label classification.

use chrono::{DateTime, Utc};

use crate::database::time::parse_rfc3339;
use crate::domain::{LiveStreamingDetails, VideoMetadata, VideoStatus};
use crate::{Error, Result};

/// Status-related fields derived from a broadcast-content label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastState {
    pub status: VideoStatus,
    /// Empty for archived videos.
    pub chat_handle: String,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Metadata resolved into canonical fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVideo {
    pub source_id: String,
    pub status: VideoStatus,
    pub chat_handle: String,
    pub published_at: DateTime<Utc>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

fn parse_schedule(details: Option<&LiveStreamingDetails>) -> Result<Option<DateTime<Utc>>> {
    details
        .and_then(|d| d.scheduled_start.as_deref())
        .filter(|s| !s.trim().is_empty())
        .map(parse_rfc3339)
        .transpose()
}

/// Map a broadcast-content label and its live-streaming block to a status.
///
/// `live` and `upcoming` require a chat handle and a schedule; `none` and
/// `completed` archive the video with the chat handle cleared. Any other
/// label, and any schedule that fails to parse, is an item-level error.
pub fn classify_broadcast(
    label: &str,
    details: Option<&LiveStreamingDetails>,
) -> Result<BroadcastState> {
    let status = match label {
        "live" => VideoStatus::Live,
        "upcoming" => VideoStatus::Upcoming,
        "none" | "completed" => {
            return Ok(BroadcastState {
                status: VideoStatus::Archived,
                chat_handle: String::new(),
                scheduled_at: parse_schedule(details)?,
            });
        }
        other => {
            return Err(Error::item_parse(format!(
                "unrecognized broadcast state '{}'",
                other
            )));
        }
    };

    let details = details.ok_or_else(|| {
        Error::item_parse(format!("{} video has no live streaming details", label))
    })?;
    let chat_handle = details
        .chat_handle
        .clone()
        .filter(|handle| !handle.is_empty())
        .ok_or_else(|| Error::item_parse(format!("{} video has no chat handle", label)))?;
    let scheduled_at = parse_schedule(Some(details))?
        .ok_or_else(|| Error::item_parse(format!("{} video has no schedule", label)))?;

    Ok(BroadcastState {
        status,
        chat_handle,
        scheduled_at: Some(scheduled_at),
    })
}

fn for_source(source_id: &str, err: Error) -> Error {
    match err {
        Error::ItemParse(msg) => Error::item_parse(format!("{}: {}", source_id, msg)),
        other => other,
    }
}

/// Classify one metadata item and check the schedule against publication.
pub fn resolve_metadata(metadata: &VideoMetadata) -> Result<ResolvedVideo> {
    let state = classify_broadcast(&metadata.broadcast_label, metadata.live_details.as_ref())
        .map_err(|e| for_source(&metadata.source_id, e))?;
    let published_at =
        parse_rfc3339(&metadata.published_at).map_err(|e| for_source(&metadata.source_id, e))?;

    if let Some(scheduled_at) = state.scheduled_at
        && scheduled_at < published_at
    {
        return Err(Error::item_parse(format!(
            "{}: scheduled at {} before publication at {}",
            metadata.source_id, scheduled_at, published_at
        )));
    }

    Ok(ResolvedVideo {
        source_id: metadata.source_id.clone(),
        status: state.status,
        chat_handle: state.chat_handle,
        published_at,
        scheduled_at: state.scheduled_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn details(handle: Option<&str>, schedule: Option<&str>) -> LiveStreamingDetails {
        LiveStreamingDetails {
            chat_handle: handle.map(str::to_string),
            scheduled_start: schedule.map(str::to_string),
        }
    }

    #[rstest]
    #[case("live", VideoStatus::Live)]
    #[case("upcoming", VideoStatus::Upcoming)]
    #[case("none", VideoStatus::Archived)]
    #[case("completed", VideoStatus::Archived)]
    fn test_known_labels(#[case] label: &str, #[case] expected: VideoStatus) {
        let d = details(Some("chat-1"), Some("2030-01-01T00:00:00Z"));
        let state = classify_broadcast(label, Some(&d)).unwrap();
        assert_eq!(state.status, expected);
        assert!(state.scheduled_at.is_some());

        if expected == VideoStatus::Archived {
            assert!(state.chat_handle.is_empty());
        } else {
            assert_eq!(state.chat_handle, "chat-1");
        }
    }

    #[rstest]
    #[case("")]
    #[case("LIVE")]
    #[case("paused")]
    fn test_unknown_labels(#[case] label: &str) {
        let d = details(Some("chat-1"), Some("2030-01-01T00:00:00Z"));
        let err = classify_broadcast(label, Some(&d)).unwrap_err();
        assert!(err.is_item_level());
        assert!(err.to_string().contains("unrecognized broadcast state"));
    }

    #[test]
    fn test_archived_schedule_optional() {
        let state = classify_broadcast("none", None).unwrap();
        assert_eq!(state.status, VideoStatus::Archived);
        assert_eq!(state.scheduled_at, None);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(details(None, Some("2030-01-01T00:00:00Z"))))]
    #[case(Some(details(Some(""), Some("2030-01-01T00:00:00Z"))))]
    #[case(Some(details(Some("chat-1"), None)))]
    #[case(Some(details(Some("chat-1"), Some("soon"))))]
    fn test_active_requirements(#[case] d: Option<LiveStreamingDetails>) {
        assert!(classify_broadcast("upcoming", d.as_ref()).is_err());
        assert!(classify_broadcast("live", d.as_ref()).is_err());
    }

    #[test]
    fn test_archived_bad_schedule_is_error() {
        let d = details(None, Some("soon"));
        assert!(classify_broadcast("completed", Some(&d)).is_err());
    }

    #[test]
    fn test_resolve_metadata() {
        let metadata = VideoMetadata {
            source_id: "abc".to_string(),
            broadcast_label: "upcoming".to_string(),
            published_at: "2029-12-01T00:00:00Z".to_string(),
            live_details: Some(details(Some("chat-abc"), Some("2030-01-01T00:00:00Z"))),
        };
        let resolved = resolve_metadata(&metadata).unwrap();
        assert_eq!(resolved.status, VideoStatus::Upcoming);
        assert_eq!(resolved.chat_handle, "chat-abc");
        assert!(resolved.scheduled_at.unwrap() > resolved.published_at);
    }

    #[test]
    fn test_resolve_metadata_rejects_schedule_before_publication() {
        let metadata = VideoMetadata {
            source_id: "abc".to_string(),
            broadcast_label: "upcoming".to_string(),
            published_at: "2030-02-01T00:00:00Z".to_string(),
            live_details: Some(details(Some("chat-abc"), Some("2030-01-01T00:00:00Z"))),
        };
        let err = resolve_metadata(&metadata).unwrap_err();
        assert!(err.is_item_level());
        assert!(err.to_string().contains("abc"));
    }
}
