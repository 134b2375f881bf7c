//! Chat record repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::Result;
use crate::database::models::ChatDbModel;
use crate::database::retry::retry_on_sqlite_busy;
use crate::database::time::{datetime_to_ms, ms_to_datetime};
use crate::domain::ChatRecord;

/// Chat record repository trait.
#[async_trait]
pub trait ChatRecordRepository: Send + Sync {
    /// Append records. Returns the number of rows written.
    async fn insert_chat_records(&self, records: &[ChatRecord]) -> Result<u64>;
    /// Most recent `published_at` persisted for `source_id`.
    async fn latest_published_at(&self, source_id: &str) -> Result<Option<DateTime<Utc>>>;
    /// Records for `source_id`, oldest first.
    async fn list_by_source_id(&self, source_id: &str) -> Result<Vec<ChatRecord>>;
}

/// SQLx implementation of ChatRecordRepository.
pub struct SqlxChatRecordRepository {
    pool: SqlitePool,
}

impl SqlxChatRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatRecordRepository for SqlxChatRecordRepository {
    async fn insert_chat_records(&self, records: &[ChatRecord]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        retry_on_sqlite_busy("insert_chat_records", || async {
            let mut tx = self.pool.begin().await?;
            let mut written = 0;
            for record in records {
                written += sqlx::query(
                    "INSERT INTO chats (source_id, message, is_negative, published_at) VALUES (?, ?, ?, ?)",
                )
                .bind(&record.source_id)
                .bind(&record.message)
                .bind(record.is_negative)
                .bind(datetime_to_ms(record.published_at))
                .execute(&mut *tx)
                .await?
                .rows_affected();
            }
            tx.commit().await?;
            Ok(written)
        })
        .await
    }

    async fn latest_published_at(&self, source_id: &str) -> Result<Option<DateTime<Utc>>> {
        let latest: Option<i64> =
            sqlx::query_scalar("SELECT MAX(published_at) FROM chats WHERE source_id = ?")
                .bind(source_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(latest.map(ms_to_datetime))
    }

    async fn list_by_source_id(&self, source_id: &str) -> Result<Vec<ChatRecord>> {
        let rows = sqlx::query_as::<_, ChatDbModel>(
            "SELECT * FROM chats WHERE source_id = ? ORDER BY published_at, id",
        )
        .bind(source_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ChatRecord::from).collect())
    }
}
