//! Durable key/value storage backends.
//!
//! SYSTEM CONTEXT
//! ==============
//! The credential store and the consent flag persist through a [`Storage`]
//! shaped like browser local storage. Backends also expose an external
//! change signal that fires when *another* execution context (tab, process)
//! mutates the shared data; writes made through a handle never fire it on
//! that same handle.
//!
//! DESIGN
//! ======
//! `MemoryStorage` models several tabs over one browser profile and is what
//! tests inject. `FileStorage` is the terminal client's durable backend.

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::state::notifier::Notifier;

/// Key holding the raw bearer token.
pub const TOKEN_KEY: &str = "token";
/// Key holding the JSON-serialized cached user.
pub const USER_KEY: &str = "user";
/// Key holding the cookie-consent acknowledgment.
pub const CONSENT_KEY: &str = "cookie-consent";

const CONSENT_ACCEPTED: &str = "accepted";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("storage quota exceeded ({limit} bytes)")]
    QuotaExceeded { limit: usize },
}

/// Synchronous string key/value store.
pub trait Storage: Send + Sync {
    /// Read `key`; `Ok(None)` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `key`; visible to the next `get_item` on any handle.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend rejects the write.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`; removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend rejects the removal.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Signal raised when a different context changed the shared data.
    fn external_changes(&self) -> Notifier;
}

/// Cookie-consent acknowledgment persisted next to the credentials.
pub struct ConsentFlag<'a> {
    storage: &'a dyn Storage,
}

impl<'a> ConsentFlag<'a> {
    #[must_use]
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    /// Whether consent was acknowledged. Unreadable storage reads as `false`.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        match self.storage.get_item(CONSENT_KEY) {
            Ok(value) => value.as_deref() == Some(CONSENT_ACCEPTED),
            Err(error) => {
                tracing::warn!(%error, "consent flag unreadable");
                false
            }
        }
    }

    /// Record acknowledgment.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the flag cannot be written.
    pub fn accept(&self) -> Result<(), StorageError> {
        self.storage.set_item(CONSENT_KEY, CONSENT_ACCEPTED)
    }
}
