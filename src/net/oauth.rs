//! OAuth redirect callback parsing.
//!
//! The backend finishes a provider sign-in by redirecting to the client's
//! callback route with `token`, `type`, `userId`, `username`, and `email` as
//! query parameters. A parsed callback is fed to the credential store exactly
//! like a direct login response; any missing or malformed field sends the
//! user back to [`OAUTH_FAILED_ROUTE`].

#[cfg(test)]
#[path = "oauth_test.rs"]
mod oauth_test;

use reqwest::Url;

use super::types::{AuthResponse, DEFAULT_TOKEN_TYPE};

/// Route shown after a failed callback.
pub const OAUTH_FAILED_ROUTE: &str = "/login?oauth=failed";
/// Route shown after a successful callback.
pub const OAUTH_SUCCESS_ROUTE: &str = "/game";

const QUERY_ONLY_BASE: &str = "http://callback.invalid/";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OAuthCallbackError {
    #[error("invalid callback URL: {0}")]
    InvalidUrl(String),
    #[error("callback missing `{0}`")]
    MissingField(&'static str),
    #[error("callback userId is not a number: {0}")]
    InvalidUserId(String),
}

/// Parse a full callback URL (`https://host/oauth/callback?...`) or a bare
/// query string (`?token=...` / `token=...`).
///
/// # Errors
///
/// Returns [`OAuthCallbackError`] when the input is not a URL or a required
/// field is missing, empty, or malformed.
pub fn parse_callback(input: &str) -> Result<AuthResponse, OAuthCallbackError> {
    let input = input.trim();
    let url = if input.contains("://") {
        Url::parse(input)
    } else {
        Url::parse(&format!("{QUERY_ONLY_BASE}?{}", input.trim_start_matches('?')))
    }
    .map_err(|e| OAuthCallbackError::InvalidUrl(e.to_string()))?;

    let mut token = None;
    let mut token_type = None;
    let mut user_id = None;
    let mut username = None;
    let mut email = None;
    for (key, value) in url.query_pairs() {
        let value = value.into_owned();
        match key.as_ref() {
            "token" => token = Some(value),
            "type" => token_type = Some(value),
            "userId" => user_id = Some(value),
            "username" => username = Some(value),
            "email" => email = Some(value),
            _ => {}
        }
    }

    let token = required(token, "token")?;
    let raw_user_id = required(user_id, "userId")?;
    let username = required(username, "username")?;
    let email = required(email, "email")?;
    let user_id = parse_user_id(&raw_user_id).ok_or(OAuthCallbackError::InvalidUserId(raw_user_id))?;
    let token_type = token_type.filter(|t| !t.is_empty()).unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_owned());

    Ok(AuthResponse { token, token_type, user_id, username, email })
}

fn required(value: Option<String>, field: &'static str) -> Result<String, OAuthCallbackError> {
    value.filter(|v| !v.is_empty()).ok_or(OAuthCallbackError::MissingField(field))
}

/// Integer ids, also accepting integral decimals such as `"12.0"`.
#[allow(clippy::cast_possible_truncation)]
fn parse_user_id(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<i64>() {
        return Some(id);
    }
    let float = raw.parse::<f64>().ok()?;
    if float.is_finite() && float.fract().abs() < f64::EPSILON && float.abs() < 9.0e15 {
        return Some(float as i64);
    }
    None
}
