use serde_json::{Map, Value};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, UtcOffset};

/// Placeholder the host writes when an entry has no real time.
pub const TIMESTAMP_SENTINEL: &str = "N/A";

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

pub fn is_real_timestamp(value: &str) -> bool {
    !value.trim().is_empty() && value != TIMESTAMP_SENTINEL
}

/// The entry's `timestamp` field, if it is a string carrying a real time.
pub fn entry_timestamp(entry: &Map<String, Value>) -> Option<&str> {
    entry
        .get("timestamp")
        .and_then(|v| v.as_str())
        .filter(|s| is_real_timestamp(s))
}

/// `2026-02-19T08:15:30.123Z` -> `2026-02-19 08:15:30`.
pub fn display_timestamp(value: Option<&str>) -> String {
    match value {
        Some(value) if !value.is_empty() => {
            value.chars().take(19).collect::<String>().replace('T', " ")
        }
        _ => TIMESTAMP_SENTINEL.to_string(),
    }
}

/// Renders an epoch-millisecond value the way the host writes `modified`.
pub fn timestamp_from_unix_ms(ms: i64) -> Option<String> {
    let nanos = i128::from(ms) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()?
        .format(TIMESTAMP_FORMAT)
        .ok()
}

/// One captured instant that every write of a reactivation derives from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReactivationClock {
    now: OffsetDateTime,
}

impl ReactivationClock {
    pub fn new(now: OffsetDateTime) -> Self {
        let now = now.to_offset(UtcOffset::UTC);
        let whole_ms = now.nanosecond() / 1_000_000 * 1_000_000;
        let now = now.replace_nanosecond(whole_ms).unwrap_or(now);
        Self { now }
    }

    pub fn unix_ms(&self) -> i64 {
        (self.now.unix_timestamp_nanos() / 1_000_000) as i64
    }

    pub fn timestamp(&self) -> Result<String, time::error::Format> {
        self.timestamp_at_offset(0)
    }

    pub fn timestamp_at_offset(&self, offset_seconds: i64) -> Result<String, time::error::Format> {
        (self.now + Duration::seconds(offset_seconds)).format(TIMESTAMP_FORMAT)
    }
}
