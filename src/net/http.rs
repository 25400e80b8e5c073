//! Authenticated request pipeline.
//!
//! ARCHITECTURE
//! ============
//! Every call goes through one configured `reqwest::Client`. On the way out
//! the current token is read from the credential store and attached as
//! `Authorization: Bearer <token>`; with no token the header is omitted
//! entirely. On the way back a `401` clears credentials (which publishes an
//! auth change), sends the navigator to the sign-in route, and fails the
//! call with [`ApiError::Unauthorized`].
//!
//! TRADE-OFFS
//! ==========
//! Any `401` is terminal: no retry, no refresh-token handshake, and no
//! distinction between expired and revoked tokens. Transport errors and
//! other statuses pass through untouched.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;

use super::error::{ApiError, extract_error_message};
use crate::config::ClientConfig;
use crate::state::credentials::CredentialStore;

/// Route the navigator is sent to after an authorization failure.
pub const SIGN_IN_ROUTE: &str = "/login";

/// Performs a full navigation to an app route.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

#[must_use]
pub fn is_authorization_failure(status: u16) -> bool {
    status == 401
}

#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base: String,
    credentials: CredentialStore,
    navigator: Arc<dyn Navigator>,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the TLS backend cannot initialize.
    pub fn new(
        config: &ClientConfig,
        credentials: CredentialStore,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base: config.api_base(), credentials, navigator })
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Start a request with the current credential attached.
    pub(crate) fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.credentials.credential() {
            Some(credential) => builder.header(AUTHORIZATION, credential.authorization_value()),
            None => builder,
        }
    }

    /// Send and classify the response; returns the body of a success.
    pub(crate) async fn send(&self, builder: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let url = response.url().path().to_owned();

        // Decided on the status line alone; the body of a 401 is never read.
        if is_authorization_failure(status) {
            self.on_authorization_failure(&url);
            return Err(ApiError::Unauthorized);
        }
        let body = response.text().await?;
        if !(200..300).contains(&status) {
            tracing::debug!(status, path = %url, "request failed");
            return Err(ApiError::Status { status, message: extract_error_message(&body), body });
        }
        Ok(body)
    }

    pub(crate) async fn send_json<T>(&self, builder: reqwest::RequestBuilder) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let body = self.send(builder).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn on_authorization_failure(&self, path: &str) {
        tracing::warn!(path, "authorization failed; clearing credentials");
        self.credentials.clear_credential();
        self.navigator.navigate(SIGN_IN_ROUTE);
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient").field("base", &self.base).finish_non_exhaustive()
    }
}
