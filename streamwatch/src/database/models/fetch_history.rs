//! Fetch history row model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::time::ms_to_datetime;
use crate::domain::FetchHistoryEntry;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FetchHistoryDbModel {
    pub id: i64,
    pub source_id: String,
    pub fetched_at: i64,
}

impl From<FetchHistoryDbModel> for FetchHistoryEntry {
    fn from(row: FetchHistoryDbModel) -> Self {
        Self {
            source_id: row.source_id,
            fetched_at: ms_to_datetime(row.fetched_at),
        }
    }
}
