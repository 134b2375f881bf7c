//! Retry helper for writes that hit `SQLITE_BUSY` / `SQLITE_LOCKED`.

use std::future::Future;
use std::time::Duration;

use rand::random;
use tokio::time::sleep;
use tracing::debug;

use crate::{Error, Result};

const MAX_RETRIES: u32 = 8;
const BASE_DELAY_MS: u64 = 10;
const MAX_DELAY_MS: u64 = 1000;

/// SQLite primary result codes for a busy or locked database.
const SQLITE_BUSY: &str = "5";
const SQLITE_LOCKED: &str = "6";

fn is_busy(err: &Error) -> bool {
    let Error::DatabaseSqlx(sqlx_err) = err else {
        return false;
    };

    if let sqlx::Error::Database(db_err) = sqlx_err
        && matches!(db_err.code().as_deref(), Some(SQLITE_BUSY) | Some(SQLITE_LOCKED))
    {
        return true;
    }

    let msg = sqlx_err.to_string().to_ascii_lowercase();
    msg.contains("database is locked") || msg.contains("database is busy")
}

/// Delay before retry number `attempt` (zero-based): capped exponential
/// backoff plus up to 25% jitter.
fn backoff(attempt: u32) -> Duration {
    let exp = BASE_DELAY_MS.saturating_mul(1u64 << attempt.min(16));
    let capped = exp.min(MAX_DELAY_MS);
    let jitter = random::<u64>() % (capped / 4 + 1);
    Duration::from_millis((capped + jitter).min(MAX_DELAY_MS))
}

/// Run `op`, retrying while SQLite reports the database as busy.
pub async fn retry_on_sqlite_busy<T, F, Fut>(op_name: &'static str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(err) if is_busy(&err) && attempt < MAX_RETRIES => {
                let delay = backoff(attempt);
                attempt += 1;
                debug!(
                    op = op_name,
                    attempt,
                    max = MAX_RETRIES,
                    "SQLite busy, retrying in {:?}",
                    delay
                );
                sleep(delay).await;
            }
            result => return result,
        }
    }
}
