//! Errors surfaced by the HTTP pipeline and typed API calls.

use super::types::ErrorBody;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport failure: DNS, connect, timeout, truncated body.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the credential. Credentials were already cleared
    /// and the navigator sent to the sign-in route.
    #[error("not authorized; sign in again")]
    Unauthorized,

    /// Any other non-success status, passed through with its body.
    #[error("server returned {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String>, body: String },

    /// A success response whose body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl ApiError {
    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Status { status, .. } => Some(*status),
            Self::Http(error) => error.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::ClientBuild(_) => None,
        }
    }

    /// Single human-readable line for display next to a form: the backend's
    /// `message` when it sent one, otherwise `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Status { message: Some(message), .. } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_owned(),
        }
    }
}

/// Pull the `message` field out of an error body.
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
        .filter(|message| !message.trim().is_empty())
}
