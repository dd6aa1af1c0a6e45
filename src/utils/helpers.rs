//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Wire format for timestamps exchanged with the stats service
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a timestamp in the stats wire format
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(DATE_TIME_FORMAT).to_string()
}

/// Parse a timestamp in the stats wire format (interpreted as UTC)
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// True when `event_date` is at least `lead_hours` after `now`
pub fn satisfies_lead_time(event_date: DateTime<Utc>, now: DateTime<Utc>, lead_hours: i64) -> bool {
    event_date >= now + Duration::hours(lead_hours)
}

/// Clamp offset paging parameters into a usable `(offset, limit)` pair
pub fn page_bounds(from: i64, size: i64) -> (i64, i64) {
    (from.max(0), size.max(1))
}

/// Case-insensitive containment used by the public text search
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
