//! In-memory storage shared between execution contexts.
//!
//! One [`MemoryStorage::new`] is a browser profile; each
//! [`MemoryStorage::open_context`] is another tab over the same data. A
//! mutation fires the external change signal on every other open context,
//! synchronously after the write, and only when the stored value changed.

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::{Storage, StorageError};
use crate::state::notifier::Notifier;

#[derive(Default)]
struct Shared {
    items: HashMap<String, String>,
    contexts: Vec<(u64, Notifier)>,
    next_context: u64,
    quota: Option<usize>,
}

impl Shared {
    fn used_bytes(&self) -> usize {
        self.items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    fn others(&self, id: u64) -> Vec<Notifier> {
        self.contexts
            .iter()
            .filter(|(context, _)| *context != id)
            .map(|(_, notifier)| notifier.clone())
            .collect()
    }
}

/// A context handle onto shared in-memory storage.
pub struct MemoryStorage {
    shared: Arc<Mutex<Shared>>,
    id: u64,
    external: Notifier,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::attach(Arc::new(Mutex::new(Shared::default())))
    }

    /// Storage that rejects writes pushing the total size past `limit` bytes.
    #[must_use]
    pub fn with_quota(limit: usize) -> Self {
        let shared = Shared { quota: Some(limit), ..Shared::default() };
        Self::attach(Arc::new(Mutex::new(shared)))
    }

    /// Open another context (tab) over the same data.
    #[must_use]
    pub fn open_context(&self) -> Self {
        Self::attach(Arc::clone(&self.shared))
    }

    fn attach(shared: Arc<Mutex<Shared>>) -> Self {
        let external = Notifier::new();
        let id = {
            let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
            let id = guard.next_context;
            guard.next_context += 1;
            guard.contexts.push((id, external.clone()));
            id
        };
        Self { shared, id, external }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn broadcast(targets: Vec<Notifier>) {
        for notifier in targets {
            notifier.publish();
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MemoryStorage {
    fn drop(&mut self) {
        let id = self.id;
        self.lock().contexts.retain(|(context, _)| *context != id);
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let targets = {
            let mut guard = self.lock();
            if guard.items.get(key).is_some_and(|current| current == value) {
                return Ok(());
            }
            if let Some(limit) = guard.quota {
                let replaced = guard.items.get(key).map_or(0, |v| key.len() + v.len());
                let projected = guard.used_bytes() - replaced + key.len() + value.len();
                if projected > limit {
                    return Err(StorageError::QuotaExceeded { limit });
                }
            }
            guard.items.insert(key.to_owned(), value.to_owned());
            guard.others(self.id)
        };
        Self::broadcast(targets);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let targets = {
            let mut guard = self.lock();
            if guard.items.remove(key).is_none() {
                return Ok(());
            }
            guard.others(self.id)
        };
        Self::broadcast(targets);
        Ok(())
    }

    fn external_changes(&self) -> Notifier {
        self.external.clone()
    }
}
