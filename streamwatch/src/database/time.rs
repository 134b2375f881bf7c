//! Timestamp helpers.
//!
//! Instants are stored as `INTEGER` Unix epoch milliseconds (UTC). Upstream
//! services report RFC 3339 strings, which are parsed here and truncated to
//! the stored precision so in-memory values compare equal to persisted ones.

use chrono::{DateTime, SubsecRound, TimeZone, Utc};

use crate::{Error, Result};

#[inline]
pub fn datetime_to_ms(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// Convert epoch milliseconds back to a `DateTime<Utc>`, clamping values
/// chrono cannot represent.
pub fn ms_to_datetime(ms: i64) -> DateTime<Utc> {
    match Utc.timestamp_millis_opt(ms).earliest() {
        Some(dt) => dt,
        None if ms.is_negative() => DateTime::<Utc>::MIN_UTC,
        None => DateTime::<Utc>::MAX_UTC,
    }
}

/// Parse an RFC 3339 timestamp (`2030-01-01T00:00:00Z`, offsets allowed).
///
/// Sub-millisecond digits are dropped. Failure is an item-level error: the
/// caller skips the element.
pub fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(3))
        .map_err(|e| Error::item_parse(format!("invalid timestamp '{}': {}", value, e)))
}
