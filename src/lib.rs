//! Latest Tweets Library
//!
//! Fetches a user's recent tweets, caches the raw API response on disk, and
//! renders the tweets as an HTML list for embedding in a page.

pub mod cache;
pub mod cli;
pub mod format;
pub mod render;
pub mod twitter;
