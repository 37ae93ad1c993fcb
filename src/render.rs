//! Rendering a user's latest tweets as an HTML list
//!
//! The renderer validates the request, pulls the timeline through the disk
//! cache, and turns each tweet into a list item with linked text and a
//! relative-time permalink.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::cache::{CacheError, DiskCache};
use crate::format::{escape_html, format_tweet, time_ago_at};
use crate::twitter::{is_valid_screen_name, ApiErrors, TimelineResponse, Tweet};

/// Number of tweets shown when the caller does not ask for a count
pub const DEFAULT_COUNT: i64 = 5;
/// Smallest accepted count
pub const MIN_COUNT: i64 = 1;
/// Largest accepted count
pub const MAX_COUNT: i64 = 100;

/// Base URL for status permalinks
const STATUS_BASE_URL: &str = "http://twitter.com";

/// Problems with the request itself; reported to readers as plain text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Numbers of tweets must be between 1 and 100.")]
    CountOutOfRange,

    #[error("Please specify a twitter username")]
    MissingUsername,

    #[error("Invalid twitter username")]
    InvalidUsername,
}

/// Failures that prevent rendering altogether
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Could not parse JSON data from Twitter: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// What to render: whose timeline, and how many tweets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub username: String,
    pub count: i64,
}

impl RenderRequest {
    /// Creates a request for `username` with the default count
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            count: DEFAULT_COUNT,
        }
    }

    /// Overrides the number of tweets
    pub fn with_count(mut self, count: i64) -> Self {
        self.count = count;
        self
    }

    /// Builds a request from tag attributes such as `username="jack" count="3"`
    ///
    /// Unknown attributes are ignored. A count that is not an integer becomes
    /// 0 and therefore fails validation.
    pub fn from_attributes<'a, I>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut request = Self::new("");
        for (name, value) in attributes {
            match name {
                "username" => request.username = value.trim().to_string(),
                "count" => request.count = value.trim().parse().unwrap_or(0),
                _ => {}
            }
        }
        request
    }

    /// Checks the request before any I/O happens
    ///
    /// The count is checked before the username.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_COUNT..=MAX_COUNT).contains(&self.count) {
            return Err(ValidationError::CountOutOfRange);
        }
        if self.username.is_empty() {
            return Err(ValidationError::MissingUsername);
        }
        if !is_valid_screen_name(&self.username) {
            return Err(ValidationError::InvalidUsername);
        }
        Ok(())
    }
}

/// Renders timelines served through a [`DiskCache`]
pub struct Renderer {
    cache: DiskCache,
}

impl Renderer {
    pub fn new(cache: DiskCache) -> Self {
        Self { cache }
    }

    /// Renders the request as markup
    ///
    /// Invalid requests and API error payloads produce a plain message in
    /// `Ok`. Configuration, network, and file system failures are returned as
    /// `Err` so the host can decide how to present them.
    pub async fn render(&self, request: &RenderRequest) -> Result<String, RenderError> {
        self.render_at(request, Utc::now()).await
    }

    /// Same as [`Renderer::render`], computing relative times against `now`
    pub async fn render_at(
        &self,
        request: &RenderRequest,
        now: DateTime<Utc>,
    ) -> Result<String, RenderError> {
        if let Err(err) = request.validate() {
            return Ok(err.to_string());
        }

        let payload = self.cache.get(&request.username).await?;

        match serde_json::from_slice::<TimelineResponse>(&payload)? {
            TimelineResponse::Failure(errors) => Ok(format_api_error(&errors)),
            TimelineResponse::Timeline(tweets) => {
                // count is validated to 1..=100
                let limit = usize::try_from(request.count).unwrap_or(0);
                Ok(render_tweets(&request.username, &tweets, limit, now))
            }
        }
    }

    /// Renders the request, downgrading hard failures to a message
    ///
    /// Failures are logged and replaced with an escaped description, so a
    /// shared host keeps serving other requests.
    pub async fn render_or_message(&self, request: &RenderRequest) -> String {
        match self.render(request).await {
            Ok(markup) => markup,
            Err(err) => {
                tracing::error!(username = %request.username, error = %err, "failed to render latest tweets");
                escape_html(&err.to_string())
            }
        }
    }
}

/// `Error: {message} ({code})` from the first API error, HTML-escaped
pub fn format_api_error(errors: &ApiErrors) -> String {
    let text = match errors.first() {
        Some(error) => format!("Error: {} ({})", error.message, error.code),
        None => "Error: Unknown error".to_string(),
    };
    escape_html(&text)
}

/// Renders up to `limit` tweets as an unordered list, in timeline order
pub fn render_tweets(username: &str, tweets: &[Tweet], limit: usize, now: DateTime<Utc>) -> String {
    let mut content = String::from("<ul class='tweets'>\n");
    for tweet in tweets.iter().take(limit) {
        // Writing into a String cannot fail
        let _ = writeln!(
            content,
            "<li>{} <span class='date'><a href='{}/{}/status/{}'>{}</a></span></li>",
            format_tweet(&tweet.text),
            STATUS_BASE_URL,
            username,
            tweet.status_id(),
            time_ago_at(&tweet.created_at, now),
        );
    }
    content.push_str("</ul>\n");
    content
}
