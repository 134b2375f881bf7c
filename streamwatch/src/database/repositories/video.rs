//! Video repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::IN_CLAUSE_CHUNK;
use crate::Result;
use crate::database::models::{NewVideoRow, VideoDbModel};
use crate::database::retry::retry_on_sqlite_busy;
use crate::database::time::{datetime_to_ms, ms_to_datetime};
use crate::domain::{Video, VideoStatus};

/// Video repository trait.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Persisted videos among `source_ids`, in no particular order.
    async fn find_by_source_ids(&self, source_ids: &[String]) -> Result<Vec<Video>>;
    /// Videos in `status`, oldest publication first.
    async fn list_by_status(&self, status: VideoStatus) -> Result<Vec<Video>>;
    /// Insert videos not yet persisted. Returns the number of rows written.
    async fn insert_videos(&self, videos: &[Video]) -> Result<u64>;
    /// Insert or update by `source_id`. Returns the number of rows written.
    async fn upsert_videos(&self, videos: &[Video]) -> Result<u64>;
    /// Most recent `updated_at` among persisted videos (feed watermark).
    ///
    /// `updated_at` mirrors the feed entry; status and schedule updates
    /// below leave it untouched so the watermark only advances with the feed.
    async fn latest_updated_at(&self) -> Result<Option<DateTime<Utc>>>;
    async fn update_status(
        &self,
        source_id: &str,
        status: VideoStatus,
        chat_handle: &str,
    ) -> Result<()>;
    async fn update_scheduled_at(
        &self,
        source_id: &str,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<()>;
}

/// SQLx implementation of VideoRepository.
pub struct SqlxVideoRepository {
    pool: SqlitePool,
}

impl SqlxVideoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn write_batch(&self, videos: &[Video], sql: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for video in videos {
            let row = NewVideoRow::from(video);
            written += sqlx::query(sql)
                .bind(row.channel_id)
                .bind(row.source_id)
                .bind(row.title)
                .bind(row.description)
                .bind(row.chat_handle)
                .bind(row.status)
                .bind(row.published_at)
                .bind(row.scheduled_at)
                .bind(row.updated_at)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;
        Ok(written)
    }
}

const INSERT_VIDEO: &str = r#"
    INSERT INTO videos (
        channel_id, source_id, title, description, chat_handle,
        status, published_at, scheduled_at, updated_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPSERT_VIDEO: &str = r#"
    INSERT INTO videos (
        channel_id, source_id, title, description, chat_handle,
        status, published_at, scheduled_at, updated_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(source_id) DO UPDATE SET
        channel_id = excluded.channel_id,
        title = excluded.title,
        description = excluded.description,
        chat_handle = excluded.chat_handle,
        status = excluded.status,
        published_at = excluded.published_at,
        scheduled_at = excluded.scheduled_at,
        updated_at = excluded.updated_at
"#;

#[async_trait]
impl VideoRepository for SqlxVideoRepository {
    async fn find_by_source_ids(&self, source_ids: &[String]) -> Result<Vec<Video>> {
        let mut videos = Vec::with_capacity(source_ids.len());
        for chunk in source_ids.chunks(IN_CLAUSE_CHUNK) {
            let mut query =
                QueryBuilder::<Sqlite>::new("SELECT * FROM videos WHERE source_id IN (");
            let mut separated = query.separated(", ");
            for source_id in chunk {
                separated.push_bind(source_id.as_str());
            }
            separated.push_unseparated(")");

            let rows = query
                .build_query_as::<VideoDbModel>()
                .fetch_all(&self.pool)
                .await?;
            for row in rows {
                videos.push(Video::try_from(row)?);
            }
        }
        Ok(videos)
    }

    async fn list_by_status(&self, status: VideoStatus) -> Result<Vec<Video>> {
        let rows = sqlx::query_as::<_, VideoDbModel>(
            "SELECT * FROM videos WHERE status = ? ORDER BY published_at, id",
        )
        .bind(status.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Video::try_from).collect()
    }

    async fn insert_videos(&self, videos: &[Video]) -> Result<u64> {
        if videos.is_empty() {
            return Ok(0);
        }
        retry_on_sqlite_busy("insert_videos", || self.write_batch(videos, INSERT_VIDEO)).await
    }

    async fn upsert_videos(&self, videos: &[Video]) -> Result<u64> {
        if videos.is_empty() {
            return Ok(0);
        }
        retry_on_sqlite_busy("upsert_videos", || self.write_batch(videos, UPSERT_VIDEO)).await
    }

    async fn latest_updated_at(&self) -> Result<Option<DateTime<Utc>>> {
        let latest: Option<i64> = sqlx::query_scalar("SELECT MAX(updated_at) FROM videos")
            .fetch_one(&self.pool)
            .await?;
        Ok(latest.map(ms_to_datetime))
    }

    async fn update_status(
        &self,
        source_id: &str,
        status: VideoStatus,
        chat_handle: &str,
    ) -> Result<()> {
        retry_on_sqlite_busy("update_video_status", || async {
            sqlx::query(
                "UPDATE videos SET status = ?, chat_handle = ? WHERE source_id = ?",
            )
            .bind(status.to_string())
            .bind(chat_handle)
            .bind(source_id)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await
    }

    async fn update_scheduled_at(
        &self,
        source_id: &str,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        retry_on_sqlite_busy("update_video_scheduled_at", || async {
            sqlx::query("UPDATE videos SET scheduled_at = ? WHERE source_id = ?")
                .bind(scheduled_at.map(datetime_to_ms))
                .bind(source_id)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }
}
