//! Chat record row model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::time::ms_to_datetime;
use crate::domain::ChatRecord;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChatDbModel {
    pub id: i64,
    pub source_id: String,
    pub message: String,
    pub is_negative: bool,
    pub published_at: i64,
}

impl From<ChatDbModel> for ChatRecord {
    fn from(row: ChatDbModel) -> Self {
        Self {
            source_id: row.source_id,
            message: row.message,
            is_negative: row.is_negative,
            published_at: ms_to_datetime(row.published_at),
        }
    }
}
