use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Formats accepted for timestamps without an explicit offset.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Half-open `[start, end)` interval covering one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Where a timestamp falls relative to a [`TimeWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    /// Newer than the window
    After,
    Within,
    /// Older than the window; everything after it in a descending feed is too
    Before,
}

impl TimeWindow {
    pub fn for_day(date: NaiveDate) -> Self {
        let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
        Self {
            start,
            end: start + Duration::days(1),
        }
    }

    pub fn classify(&self, instant: DateTime<Utc>) -> WindowPosition {
        if instant < self.start {
            WindowPosition::Before
        } else if instant < self.end {
            WindowPosition::Within
        } else {
            WindowPosition::After
        }
    }
}

/// Parses an API `created_at` value into UTC.
///
/// Accepts RFC 3339 (`Z` or numeric offsets) with either `T` or a space as
/// separator. Values without an offset are taken to already be UTC.
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
}
