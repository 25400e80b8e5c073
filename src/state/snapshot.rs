//! Memoized `{authenticated, user}` snapshot.
//!
//! Watchers detect change by `Arc` identity, so [`SnapshotReader::read`]
//! hands back the previously cached `Arc` whenever the freshly read value is
//! equal to it, and allocates only when something actually changed.

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;

use std::sync::{Arc, Mutex, PoisonError};

use super::credentials::CredentialStore;
use crate::net::types::CachedUser;

/// Derived session state. `authenticated` is true iff a token was present
/// in durable storage at read time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub authenticated: bool,
    pub user: Option<CachedUser>,
}

pub struct SnapshotReader {
    store: CredentialStore,
    cached: Mutex<Arc<SessionSnapshot>>,
}

impl SnapshotReader {
    #[must_use]
    pub fn new(store: CredentialStore) -> Self {
        Self { store, cached: Mutex::new(Arc::new(SessionSnapshot::default())) }
    }

    #[must_use]
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Read the store and return the current snapshot.
    ///
    /// A detached store always yields the same unauthenticated snapshot.
    #[must_use]
    pub fn read(&self) -> Arc<SessionSnapshot> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if self.store.is_detached() {
            return Arc::clone(&cached);
        }

        let authenticated = self.store.is_authenticated();
        let user = self.store.get_user();
        if cached.authenticated == authenticated && users_equal(cached.user.as_ref(), user.as_ref()) {
            return Arc::clone(&cached);
        }

        tracing::debug!(authenticated, user_id = user.as_ref().map(|u| u.user_id), "session snapshot changed");
        let next = Arc::new(SessionSnapshot { authenticated, user });
        *cached = Arc::clone(&next);
        next
    }

    /// Last computed snapshot, without consulting storage.
    #[must_use]
    pub fn last(&self) -> Arc<SessionSnapshot> {
        Arc::clone(&self.cached.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

fn users_equal(a: Option<&CachedUser>, b: Option<&CachedUser>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.user_id == b.user_id && a.username == b.username && a.email == b.email,
        _ => false,
    }
}
