//! Twitter user-timeline API client
//!
//! Performs one OAuth-signed GET per call. There is no retry or backoff; the
//! disk cache decides how often this is reached.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use thiserror::Error;

use super::{oauth, ApiErrors, Credentials, CREDENTIAL_KEYS};

/// Default base URL for the Twitter REST API
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";

/// Path of the user-timeline resource, relative to the API base
const USER_TIMELINE_PATH: &str = "/1.1/statuses/user_timeline.json";

/// Errors that can occur when fetching a timeline
#[derive(Debug, Error)]
pub enum FetchError {
    /// Not all four credentials are configured
    #[error("Twitter credentials are not configured. Set {}", CREDENTIAL_KEYS.join(", "))]
    MissingCredentials,

    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Twitter answered with a non-success status and no error payload
    #[error("Twitter returned HTTP {status}")]
    Status { status: StatusCode, body: String },

    /// Twitter answered with an empty body
    #[error("Could not get JSON data from Twitter")]
    EmptyBody,
}

/// Source of raw user-timeline JSON
#[async_trait]
pub trait TimelineFetcher: Send + Sync {
    /// Fetches the raw timeline body for `username`
    async fn fetch(&self, username: &str) -> Result<String, FetchError>;
}

/// Settings for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API, without a trailing slash
    pub api_base: String,
    /// Overall request timeout; `None` keeps the transport default
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: None,
        }
    }
}

/// Client for the user-timeline endpoint
#[derive(Debug, Clone)]
pub struct TwitterClient {
    client: Client,
    api_base: String,
    credentials: Option<Credentials>,
}

impl TwitterClient {
    /// Create a new TwitterClient
    ///
    /// Missing credentials are not an error here; they are reported on the
    /// first fetch.
    pub fn new(config: &ClientConfig, credentials: Option<Credentials>) -> Result<Self, FetchError> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Create a new TwitterClient with a custom HTTP client
    pub fn with_client(client: Client, api_base: impl Into<String>, credentials: Option<Credentials>) -> Self {
        let api_base: String = api_base.into();
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// Fetch the raw user timeline for `username`
    ///
    /// # Arguments
    /// * `username` - Screen name passed as `screen_name`
    /// * `credentials` - Credentials used to sign the request
    ///
    /// # Returns
    /// * `Ok(String)` - The response body, untouched. Rate limits and unknown
    ///   users arrive as non-2xx responses with an `errors` payload; that body
    ///   is returned too, so it is cached and rendered like any other reply.
    /// * `Err(FetchError)` - On transport failure, a non-2xx status without an
    ///   error payload, or an empty body
    pub async fn fetch_timeline(
        &self,
        username: &str,
        credentials: &Credentials,
    ) -> Result<String, FetchError> {
        let endpoint = format!("{}{}", self.api_base, USER_TIMELINE_PATH);
        let query = [("screen_name", username)];
        let authorization = oauth::authorization_header("GET", &endpoint, &query, credentials);
        let url = format!("{}?screen_name={}", endpoint, urlencoding::encode(username));

        tracing::debug!(%username, "fetching user timeline");
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, authorization)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if carries_api_errors(&body) {
                tracing::warn!(%username, %status, "timeline request returned API errors");
                return Ok(body);
            }
            tracing::warn!(%username, %status, "timeline request was rejected");
            return Err(FetchError::Status { status, body });
        }
        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody);
        }

        Ok(body)
    }
}

/// True if `body` is an `{"errors": [...]}` payload with at least one entry
fn carries_api_errors(body: &str) -> bool {
    serde_json::from_str::<ApiErrors>(body).is_ok_and(|errors| !errors.errors.is_empty())
}

#[async_trait]
impl TimelineFetcher for TwitterClient {
    async fn fetch(&self, username: &str) -> Result<String, FetchError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(FetchError::MissingCredentials)?;
        self.fetch_timeline(username, credentials).await
    }
}
