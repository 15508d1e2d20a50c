//! Relative datetime parsing for scheduling tools.
//!
//! Assistant hosts pass times like "today 3pm" or "tomorrow". The grammar is
//! deliberately narrow: `today`/`tomorrow` with an optional `h[:mm]am|pm`
//! time; anything else must be RFC 3339. Bare `today`/`tomorrow` keep the
//! current time of day. The function is pure: `now` is an input, so it is
//! testable without a clock.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use thiserror::Error;

/// Datetime parsing errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Input matched neither the relative grammar nor RFC 3339
    #[error("Unrecognized datetime: {0}")]
    Unrecognized(String),

    /// Relative day was recognized but the time portion was malformed
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),
}

/// Parse a relative or RFC 3339 datetime.
pub fn parse_relative_datetime(
    input: &str,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ParseError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    let (day_offset, rest) = if let Some(rest) = lower.strip_prefix("today") {
        (0, rest.trim())
    } else if let Some(rest) = lower.strip_prefix("tomorrow") {
        (1, rest.trim())
    } else {
        // Not relative: delegate to standard ISO parsing.
        return DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| ParseError::Unrecognized(trimmed.to_string()));
    };

    let date = (now + Duration::days(day_offset)).date_naive();

    let time = if rest.is_empty() {
        now.time()
    } else {
        parse_time_of_day(rest)?
    };

    match Utc.from_local_datetime(&date.and_time(time)).single() {
        Some(dt) => Ok(dt),
        None => Err(ParseError::InvalidTime(rest.to_string())),
    }
}

/// Parse `h[:mm]am|pm` (e.g. "3pm", "10:30am").
fn parse_time_of_day(input: &str) -> Result<NaiveTime, ParseError> {
    let invalid = || ParseError::InvalidTime(input.to_string());

    let (clock, pm) = if let Some(clock) = input.strip_suffix("pm") {
        (clock.trim(), true)
    } else if let Some(clock) = input.strip_suffix("am") {
        (clock.trim(), false)
    } else {
        return Err(invalid());
    };

    let (hour_str, minute_str) = match clock.split_once(':') {
        Some((h, m)) => (h, m),
        None => (clock, "0"),
    };

    let hour: u32 = hour_str.parse().map_err(|_| invalid())?;
    let minute: u32 = minute_str.parse().map_err(|_| invalid())?;

    if !(1..=12).contains(&hour) || minute > 59 {
        return Err(invalid());
    }

    // 12am is midnight, 12pm is noon.
    let hour24 = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };

    NaiveTime::from_hms_opt(hour24, minute, 0).ok_or_else(invalid)
}
