//! Fetch history repository.

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::IN_CLAUSE_CHUNK;
use crate::Result;
use crate::database::models::FetchHistoryDbModel;
use crate::database::retry::retry_on_sqlite_busy;
use crate::database::time::datetime_to_ms;
use crate::domain::FetchHistoryEntry;

/// Fetch history repository trait.
#[async_trait]
pub trait FetchHistoryRepository: Send + Sync {
    async fn insert_fetch_history(&self, entry: &FetchHistoryEntry) -> Result<()>;
    /// All entries for the given sources, oldest first.
    async fn find_by_source_ids(&self, source_ids: &[String]) -> Result<Vec<FetchHistoryEntry>>;
}

/// SQLx implementation of FetchHistoryRepository.
pub struct SqlxFetchHistoryRepository {
    pool: SqlitePool,
}

impl SqlxFetchHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FetchHistoryRepository for SqlxFetchHistoryRepository {
    async fn insert_fetch_history(&self, entry: &FetchHistoryEntry) -> Result<()> {
        retry_on_sqlite_busy("insert_fetch_history", || async {
            sqlx::query("INSERT INTO fetch_history (source_id, fetched_at) VALUES (?, ?)")
                .bind(&entry.source_id)
                .bind(datetime_to_ms(entry.fetched_at))
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }

    async fn find_by_source_ids(&self, source_ids: &[String]) -> Result<Vec<FetchHistoryEntry>> {
        let mut entries = Vec::new();
        for chunk in source_ids.chunks(IN_CLAUSE_CHUNK) {
            let mut query =
                QueryBuilder::<Sqlite>::new("SELECT * FROM fetch_history WHERE source_id IN (");
            let mut separated = query.separated(", ");
            for source_id in chunk {
                separated.push_bind(source_id.as_str());
            }
            separated.push_unseparated(") ORDER BY fetched_at, id");

            let rows = query
                .build_query_as::<FetchHistoryDbModel>()
                .fetch_all(&self.pool)
                .await?;
            entries.extend(rows.into_iter().map(FetchHistoryEntry::from));
        }
        Ok(entries)
    }
}
