//! Cutoff date parsing.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

use crate::error::InvalidDate;

/// Parse a `--before` value.
///
/// Accepts a calendar date (`2023-01-01`, midnight UTC) or a full RFC 3339
/// timestamp (`2023-01-01T12:00:00+02:00`).
///
/// # Errors
///
/// Returns [`InvalidDate`] for anything else.
pub fn parse_cutoff(input: &str) -> Result<DateTime<Utc>, InvalidDate> {
    let trimmed = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| InvalidDate {
            input: input.to_string(),
        })
}

/// Cutoff used when no `--before` is given: `horizon_days` before `now`.
///
/// Saturates at the earliest representable instant, where nothing is stale.
pub fn default_cutoff(now: DateTime<Utc>, horizon_days: u32) -> DateTime<Utc> {
    TimeDelta::try_days(i64::from(horizon_days))
        .and_then(|horizon| now.checked_sub_signed(horizon))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
