//! Twitter API credentials
//!
//! All four OAuth values must be present and non-empty. A partial set is
//! treated the same as no credentials at all.

use std::fmt;

/// Environment key holding the application consumer key
pub const CONSUMER_KEY: &str = "GLT_TWITTER_CONSUMER_KEY";
/// Environment key holding the application consumer secret
pub const CONSUMER_SECRET: &str = "GLT_TWITTER_CONSUMER_SECRET";
/// Environment key holding the user access token
pub const USER_TOKEN: &str = "GLT_TWITTER_USER_TOKEN";
/// Environment key holding the user access token secret
pub const USER_SECRET: &str = "GLT_TWITTER_USER_SECRET";

/// Every key that must be configured, in lookup order
pub const CREDENTIAL_KEYS: [&str; 4] = [CONSUMER_KEY, CONSUMER_SECRET, USER_TOKEN, USER_SECRET];

/// OAuth 1.0a credentials for the user-timeline endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub user_token: String,
    pub user_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("user_token", &self.user_token)
            .field("user_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Reads credentials from the process environment
    ///
    /// Returns `None` unless all four keys are set to non-empty values.
    pub fn from_env() -> Option<Self> {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Builds credentials from an arbitrary key lookup
    ///
    /// # Arguments
    /// * `lookup` - Returns the configured value for a key, if any
    ///
    /// # Returns
    /// * `Some(Credentials)` if every key resolves to a non-empty value
    /// * `None` otherwise
    pub fn resolve<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Some(Self {
            consumer_key: value(CONSUMER_KEY)?,
            consumer_secret: value(CONSUMER_SECRET)?,
            user_token: value(USER_TOKEN)?,
            user_secret: value(USER_SECRET)?,
        })
    }
}
