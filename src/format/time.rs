//! Relative time descriptions for tweet permalinks

use chrono::{DateTime, Utc};

const SECOND: i64 = 1;
const MINUTE: i64 = SECOND * 60;
const HOUR: i64 = MINUTE * 60;
const DAY: i64 = HOUR * 24;

/// Layout of Twitter's `created_at` field, e.g. `Wed Aug 27 13:08:45 +0000 2008`
const TWITTER_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Parses a tweet timestamp into UTC
///
/// Accepts Twitter's own layout first, then RFC 3339 and RFC 2822.
/// Returns `None` if none of them match.
pub fn parse_created_at(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_str(value, TWITTER_TIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Describes how long ago `created_at` was, relative to the current time
///
/// Returns an empty string if the timestamp cannot be parsed or lies in the future.
pub fn time_ago(created_at: &str) -> String {
    time_ago_at(created_at, Utc::now())
}

/// Same as [`time_ago`], measured against an explicit `now`
pub fn time_ago_at(created_at: &str, now: DateTime<Utc>) -> String {
    match parse_created_at(created_at) {
        Some(then) => describe_elapsed((now - then).num_seconds()),
        None => String::new(),
    }
}

/// Maps an elapsed number of seconds onto a human-readable bucket
///
/// Buckets are checked in order and the first match wins. An elapsed time of
/// exactly one day is not "yesterday"; it falls through to "1 days ago".
pub fn describe_elapsed(diff: i64) -> String {
    if diff < 0 {
        return String::new();
    }

    if diff < SECOND * 2 {
        "right now".to_string()
    } else if diff < MINUTE {
        format!("{} seconds ago", diff / SECOND)
    } else if diff < MINUTE * 2 {
        "about 1 minute ago".to_string()
    } else if diff < HOUR {
        format!("{} minutes ago", diff / MINUTE)
    } else if diff < HOUR * 2 {
        "about 1 hour ago".to_string()
    } else if diff < DAY {
        format!("{} hours ago", diff / HOUR)
    } else if diff > DAY && diff < DAY * 2 {
        "yesterday".to_string()
    } else if diff < DAY * 365 {
        format!("{} days ago", diff / DAY)
    } else {
        "over a year ago".to_string()
    }
}
