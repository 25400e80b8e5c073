//! Persisted credential store.
//!
//! SYSTEM CONTEXT
//! ==============
//! Owns the two durable entries that make a session: the bearer token and
//! the cached user. Login, OAuth callback, logout, and the HTTP pipeline's
//! authorization-failure path all go through here.
//!
//! ERROR HANDLING
//! ==============
//! No operation fails. Storage and encoding errors are logged and read as
//! "no credential". A malformed cached user reads as `None` and is left in
//! storage untouched.
//!
//! A store built with [`CredentialStore::detached`] has no durable storage
//! (server-side rendering, headless contexts): writes are no-ops and reads
//! are empty.

#[cfg(test)]
#[path = "credentials_test.rs"]
mod credentials_test;

use std::sync::Arc;

use super::notifier::Notifier;
use crate::net::types::{AuthResponse, CachedUser, DEFAULT_TOKEN_TYPE};
use crate::storage::{Storage, StorageError, TOKEN_KEY, USER_KEY};

/// A bearer credential as presented on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub token_type: String,
}

impl Credential {
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self { token: token.into(), token_type: DEFAULT_TOKEN_TYPE.to_owned() }
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn authorization_value(&self) -> String {
        format!("{} {}", self.token_type, self.token)
    }
}

#[derive(Clone)]
pub struct CredentialStore {
    storage: Option<Arc<dyn Storage>>,
    notifier: Notifier,
}

impl CredentialStore {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, notifier: Notifier) -> Self {
        Self { storage: Some(storage), notifier }
    }

    #[must_use]
    pub fn detached(notifier: Notifier) -> Self {
        Self { storage: None, notifier }
    }

    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.storage.is_none()
    }

    /// The auth change notifier this store publishes on.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    #[must_use]
    pub fn storage(&self) -> Option<&Arc<dyn Storage>> {
        self.storage.as_ref()
    }

    /// Persist `token` and `user`. Does not publish; callers that complete a
    /// sign-in use [`CredentialStore::handle_auth_response`].
    ///
    /// The user is written before the token. If either write fails both
    /// entries are removed, so a token never sits next to a missing or
    /// previous user.
    pub fn set_credential(&self, token: &str, user: &CachedUser) {
        let Some(storage) = &self.storage else {
            return;
        };
        let written = serde_json::to_string(user)
            .map_err(StorageError::from)
            .and_then(|serialized| storage.set_item(USER_KEY, &serialized))
            .and_then(|()| storage.set_item(TOKEN_KEY, token));
        if let Err(error) = written {
            tracing::warn!(%error, "failed to persist credential; rolling back");
            remove_entries(storage.as_ref());
        }
    }

    #[must_use]
    pub fn get_credential(&self) -> Option<String> {
        let storage = self.storage.as_ref()?;
        match storage.get_item(TOKEN_KEY) {
            Ok(token) => token,
            Err(error) => {
                tracing::warn!(%error, "failed to read token");
                None
            }
        }
    }

    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        self.get_credential().map(Credential::bearer)
    }

    #[must_use]
    pub fn get_user(&self) -> Option<CachedUser> {
        let storage = self.storage.as_ref()?;
        let raw = match storage.get_item(USER_KEY) {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!(%error, "failed to read cached user");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(error) => {
                tracing::debug!(%error, "cached user malformed");
                None
            }
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.get_credential().is_some()
    }

    /// Remove token and cached user, then publish one auth change.
    pub fn clear_credential(&self) {
        if let Some(storage) = &self.storage {
            remove_entries(storage.as_ref());
        }
        self.notifier.publish();
    }

    /// Persist a successful sign-in and publish one auth change.
    pub fn handle_auth_response(&self, response: &AuthResponse) {
        self.set_credential(&response.token, &response.user());
        tracing::info!(user_id = response.user_id, username = %response.username, "signed in");
        self.notifier.publish();
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("detached", &self.is_detached())
            .field("notifier", &self.notifier)
            .finish()
    }
}

fn remove_entries(storage: &dyn Storage) {
    for key in [TOKEN_KEY, USER_KEY] {
        if let Err(error) = storage.remove_item(key) {
            tracing::warn!(%error, key, "failed to remove credential entry");
        }
    }
}
