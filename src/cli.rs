//! Command-line interface parsing for latest-tweets
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the render request plus cache and client settings used at startup.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::cache::{CacheConfig, DEFAULT_TTL};
use crate::render::{RenderRequest, DEFAULT_COUNT};
use crate::twitter::{ClientConfig, DEFAULT_API_BASE};

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// No cache directory was given and none could be derived from the home directory
    #[error("Could not determine a cache directory; pass --cache-dir")]
    NoCacheDir,
}

/// latest-tweets - Render a user's recent tweets as an HTML list
#[derive(Parser, Debug)]
#[command(name = "latest-tweets")]
#[command(about = "Render a user's recent tweets as an HTML list, cached on disk")]
#[command(version)]
pub struct Cli {
    /// Twitter screen name whose timeline to render
    #[arg(value_name = "USERNAME")]
    pub username: Option<String>,

    /// Number of tweets to show (1-100)
    #[arg(short, long, default_value_t = DEFAULT_COUNT, allow_negative_numbers = true)]
    pub count: i64,

    /// Directory holding cached timeline responses
    ///
    /// Defaults to the platform cache directory, e.g. ~/.cache/latest-tweets
    #[arg(long, value_name = "PATH", env = "LATEST_TWEETS_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Seconds a cached timeline stays fresh
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TTL.as_secs(), env = "LATEST_TWEETS_TTL_SECS")]
    pub ttl_secs: u64,

    /// Timeout for the upstream request, in seconds (transport default if unset)
    #[arg(long, value_name = "SECS", env = "LATEST_TWEETS_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Base URL of the Twitter API
    #[arg(long, value_name = "URL", default_value = DEFAULT_API_BASE, env = "LATEST_TWEETS_API_BASE")]
    pub api_base: String,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// What to render
    pub request: RenderRequest,
    /// Where to cache responses and for how long
    pub cache: CacheConfig,
    /// How to reach the API
    pub client: ClientConfig,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if no cache directory can be determined
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let ttl = Duration::from_secs(cli.ttl_secs);
        let cache = match &cli.cache_dir {
            Some(dir) => CacheConfig::new(dir.clone()),
            None => CacheConfig::default_location().ok_or(CliError::NoCacheDir)?,
        }
        .with_ttl(ttl);

        let request = RenderRequest::new(cli.username.clone().unwrap_or_default()).with_count(cli.count);

        let client = ClientConfig {
            api_base: cli.api_base.clone(),
            timeout: cli.timeout_secs.map(Duration::from_secs),
        };

        Ok(StartupConfig {
            request,
            cache,
            client,
        })
    }
}
