//! Formatting helpers for rendered tweets
//!
//! Turns raw tweet text into linked markup and absolute `created_at`
//! timestamps into relative strings such as "5 minutes ago".

mod text;
mod time;

pub use text::{escape_html, format_tweet};
pub use time::{describe_elapsed, parse_created_at, time_ago, time_ago_at};
