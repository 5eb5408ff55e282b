//! Window granularity and time handling

use crate::error::{Error, Result};
use crate::types::{value_to_string, JsonValue};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Wall-clock format of `start_time`/`end_time` request parameters
pub const WINDOW_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Time-series bucket size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Granularity {
    /// Daily buckets, 30-day windows
    Day,
    /// Hourly buckets, 7-day windows
    Hour,
}

impl Granularity {
    /// Maximum width of a single request window
    pub fn step(self) -> Duration {
        match self {
            Self::Day => Duration::days(30),
            Self::Hour => Duration::days(7),
        }
    }

    /// Truncate a timestamp to the start of its bucket
    pub fn truncate(self, at: NaiveDateTime) -> NaiveDateTime {
        let hour = match self {
            Self::Day => 0,
            Self::Hour => at.hour(),
        };
        at.date().and_hms_opt(hour, 0, 0).unwrap_or(at)
    }

    /// API parameter value
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "DAY",
            Self::Hour => "HOUR",
        }
    }

    /// Stream name suffix
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Day => "daily",
            Self::Hour => "hourly",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a bookmark or start date into the wall time requested from the API
///
/// Offset-carrying timestamps keep their local wall time
/// (`2024-01-01T00:00:00.000-08:00` starts at `2024-01-01T00:00:00`).
pub fn parse_start_time(value: &JsonValue) -> Result<NaiveDateTime> {
    let raw = value_to_string(value);
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, WINDOW_TIME_FORMAT) {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }

    Err(Error::invalid_value(
        "start_time",
        format!("'{raw}' is not a recognizable timestamp"),
    ))
}
