//! Tweet text linking: @mentions and bare URLs become anchors

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Base URL for profile links generated from @mentions
const PROFILE_BASE_URL: &str = "http://twitter.com";

/// `@handle` or fullwidth `＠handle`, not preceded by a word character
static MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\B[@＠]([a-zA-Z0-9_]{1,20})").expect("mention pattern is valid")
});

/// A URL starting with a scheme or `www.`, optionally followed by trailing
/// punctuation, and terminated by whitespace or the end of the text.
///
/// Groups: 1 = URL, 2 = scheme or `www.`, 3 = everything after the URL.
static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b((https?://|www\.)[^"']+?)([!?,.)]*(?:\s|$))"#).expect("URL pattern is valid")
});

/// Converts raw tweet text into markup
///
/// Mentions are linked first; the URL pass then runs over that output. The
/// raw text is not HTML-escaped: tweet text from the API is trusted.
pub fn format_tweet(text: &str) -> String {
    let with_mentions = MENTION.replace_all(text, |caps: &Captures| {
        let handle = &caps[1];
        format!("@<a class='atreply' href='{PROFILE_BASE_URL}/{handle}'>{handle}</a>")
    });

    URL.replace_all(&with_mentions, |caps: &Captures| {
        let url = &caps[1];
        // Only a literal `www.` start lacks a scheme
        let scheme = if &caps[2] == "www." { "http://" } else { "" };
        format!("<a href='{scheme}{url}'>{url}</a>{}", &caps[3])
    })
    .into_owned()
}

/// Escapes the characters that are significant in HTML text and attributes
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
