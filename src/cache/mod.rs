//! Cache module for storing timeline responses on disk
//!
//! This module provides a disk cache that keeps the raw API response for each
//! username and refreshes it from upstream once it is older than the TTL,
//! keeping request volume under the API rate limit.

mod manager;

pub use manager::{CacheConfig, CacheError, DiskCache, DEFAULT_TTL};
