//! latest-tweets - Render a user's recent tweets as HTML
//!
//! Prints the rendered list to stdout. Logs go to stderr.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use latest_tweets::cache::DiskCache;
use latest_tweets::cli::{Cli, StartupConfig};
use latest_tweets::render::Renderer;
use latest_tweets::twitter::{Credentials, TwitterClient};

/// Sets up logging to stderr, filtered by `RUST_LOG` (default `info`)
fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Credentials are only required once a fetch is needed
    let client = match TwitterClient::new(&config.client, Credentials::from_env()) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let renderer = Renderer::new(DiskCache::new(config.cache, Arc::new(client)));

    match renderer.render(&config.request).await {
        Ok(markup) => {
            print!("{}", markup);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(username = %config.request.username, error = %e, "render failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
