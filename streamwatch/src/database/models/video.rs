//! Video row model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::time::{datetime_to_ms, ms_to_datetime};
use crate::domain::{Video, VideoStatus};
use crate::{Error, Result};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct VideoDbModel {
    pub id: i64,
    pub channel_id: String,
    pub source_id: String,
    pub title: String,
    pub description: String,
    pub chat_handle: String,
    /// UPCOMING, LIVE or ARCHIVED.
    pub status: String,
    pub published_at: i64,
    pub scheduled_at: Option<i64>,
    pub updated_at: i64,
}

impl TryFrom<VideoDbModel> for Video {
    type Error = Error;

    fn try_from(row: VideoDbModel) -> Result<Self> {
        let status = row.status.parse::<VideoStatus>().map_err(|_| {
            Error::Other(format!(
                "video {} has unknown status '{}'",
                row.source_id, row.status
            ))
        })?;

        Ok(Video {
            channel_id: row.channel_id,
            source_id: row.source_id,
            title: row.title,
            description: row.description,
            chat_handle: row.chat_handle,
            status,
            published_at: ms_to_datetime(row.published_at),
            scheduled_at: row.scheduled_at.map(ms_to_datetime),
            updated_at: ms_to_datetime(row.updated_at),
        })
    }
}

/// Column values for an insert or upsert; `id` is assigned by SQLite.
#[derive(Debug, Clone)]
pub struct NewVideoRow<'a> {
    pub channel_id: &'a str,
    pub source_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub chat_handle: &'a str,
    pub status: String,
    pub published_at: i64,
    pub scheduled_at: Option<i64>,
    pub updated_at: i64,
}

impl<'a> From<&'a Video> for NewVideoRow<'a> {
    fn from(video: &'a Video) -> Self {
        Self {
            channel_id: &video.channel_id,
            source_id: &video.source_id,
            title: &video.title,
            description: &video.description,
            chat_handle: &video.chat_handle,
            status: video.status.to_string(),
            published_at: datetime_to_ms(video.published_at),
            scheduled_at: video.scheduled_at.map(datetime_to_ms),
            updated_at: datetime_to_ms(video.updated_at),
        }
    }
}
