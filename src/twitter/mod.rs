//! Twitter API access and response models
//!
//! This module holds the user-timeline client, the OAuth 1.0a request signing
//! it needs, credential lookup, and the shapes of the JSON the timeline
//! endpoint returns.

pub mod client;
pub mod credentials;
pub mod oauth;

pub use client::{ClientConfig, FetchError, TimelineFetcher, TwitterClient, DEFAULT_API_BASE};
pub use credentials::{Credentials, CREDENTIAL_KEYS};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Longest handle accepted as a screen name (and as a cache file name)
pub const MAX_SCREEN_NAME_LEN: usize = 20;

/// Returns true if `name` is a plausible screen name: 1 to 20 ASCII letters,
/// digits or underscores. Anything else is unsafe to use as a file name.
pub fn is_valid_screen_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_SCREEN_NAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A single tweet from the user timeline
///
/// Only the fields needed for rendering are kept; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Tweet {
    /// Raw tweet text
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    /// String form of the tweet id
    #[serde(default)]
    pub id_str: Option<String>,
    /// Numeric (or occasionally string) tweet id
    #[serde(default)]
    pub id: Option<Value>,
    /// Creation time, e.g. `Wed Aug 27 13:08:45 +0000 2008`
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,
}

/// Reads a string field that the API sometimes sends as `null`
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Tweet {
    /// Identifier used in the status permalink
    ///
    /// Prefers `id_str`, falling back to `id`.
    pub fn status_id(&self) -> String {
        if let Some(id) = self.id_str.as_deref().filter(|id| !id.is_empty()) {
            return id.to_string();
        }
        match &self.id {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => String::new(),
        }
    }
}

/// One entry of an API error payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default)]
    pub code: i64,
}

/// Error payload returned by the API, e.g. for rate limits or unknown users
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrors {
    pub errors: Vec<ApiError>,
}

impl ApiErrors {
    /// The entry shown to readers: the first one, if any
    pub fn first(&self) -> Option<&ApiError> {
        self.errors.first()
    }
}

/// Everything the user-timeline endpoint can return
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TimelineResponse {
    /// An array of tweets, newest first
    Timeline(Vec<Tweet>),
    /// `{"errors": [...]}`
    Failure(ApiErrors),
}
