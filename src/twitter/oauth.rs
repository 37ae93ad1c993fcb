//! OAuth 1.0a request signing (HMAC-SHA1)
//!
//! Only what a signed GET with query parameters needs: no body parameters,
//! no PLAINTEXT or RSA methods.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::{distributions::Alphanumeric, Rng};
use sha1::Sha1;
use urlencoding::encode;

use super::Credentials;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";
const NONCE_LEN: usize = 32;

/// Builds the `Authorization` header value for a request
///
/// # Arguments
/// * `method` - HTTP method, e.g. `GET`
/// * `url` - Request URL without query string
/// * `query` - Query parameters that will be sent with the request
/// * `credentials` - Consumer and user credentials
pub fn authorization_header(
    method: &str,
    url: &str,
    query: &[(&str, &str)],
    credentials: &Credentials,
) -> String {
    let nonce = generate_nonce();
    let timestamp = Utc::now().timestamp().to_string();
    signed_authorization_header(method, url, query, credentials, &nonce, &timestamp)
}

/// Same as [`authorization_header`] with a caller-supplied nonce and timestamp
pub fn signed_authorization_header(
    method: &str,
    url: &str,
    query: &[(&str, &str)],
    credentials: &Credentials,
    nonce: &str,
    timestamp: &str,
) -> String {
    let mut oauth_params: Vec<(&str, &str)> = vec![
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", SIGNATURE_METHOD),
        ("oauth_timestamp", timestamp),
        ("oauth_token", credentials.user_token.as_str()),
        ("oauth_version", OAUTH_VERSION),
    ];

    let mut all_params = oauth_params.clone();
    all_params.extend_from_slice(query);
    let signature = sign(
        method,
        url,
        &all_params,
        &credentials.consumer_secret,
        &credentials.user_secret,
    );
    oauth_params.push(("oauth_signature", signature.as_str()));

    let fields = oauth_params
        .iter()
        .map(|(key, value)| format!("{}=\"{}\"", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {}", fields)
}

/// Computes the base64 HMAC-SHA1 signature over the signature base string
pub fn sign(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    consumer_secret: &str,
    token_secret: &str,
) -> String {
    let base = signature_base_string(method, url, params);
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));

    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(base.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// `METHOD&encoded-url&encoded-sorted-params`
fn signature_base_string(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(key, value)| (encode(key).into_owned(), encode(value).into_owned()))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&param_string)
    )
}

fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}
