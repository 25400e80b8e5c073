//! JSON-file storage for the terminal client.
//!
//! DESIGN
//! ======
//! The whole store is one JSON object of string values. Every read goes to
//! disk, so a write is visible to the next read from any process. Writes
//! land in a sibling temp file and are renamed into place. A malformed file
//! reads as empty and is left for the next write to replace.
//!
//! Other processes are "other contexts": [`FileStorage::watch`] polls the
//! file's modification stamp and raises the external change signal when it
//! moves for a reason other than this handle's own writes.

#[cfg(test)]
#[path = "file_test.rs"]
mod file_test;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use super::{Storage, StorageError};
use crate::state::notifier::Notifier;

const STORAGE_FILE_NAME: &str = "storage.json";

type Stamp = Option<(SystemTime, u64)>;

pub struct FileStorage {
    path: PathBuf,
    last_seen: Arc<Mutex<Stamp>>,
    external: Notifier,
}

impl FileStorage {
    /// Storage backed by `<dir>/storage.json`. The directory is created on
    /// first write.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::at(dir.join(STORAGE_FILE_NAME))
    }

    #[must_use]
    pub fn at(path: PathBuf) -> Self {
        let stamp = stamp_of(&path);
        Self { path, last_seen: Arc::new(Mutex::new(stamp)), external: Notifier::new() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Poll for changes made by other processes every `interval`, on the
    /// ambient runtime. `None` outside one.
    ///
    /// Abort the returned handle to stop watching.
    #[must_use]
    pub fn watch(&self, interval: Duration) -> Option<tokio::task::JoinHandle<()>> {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        Some(self.watch_on(&handle, interval))
    }

    /// [`FileStorage::watch`] on an explicit runtime.
    pub fn watch_on(&self, handle: &tokio::runtime::Handle, interval: Duration) -> tokio::task::JoinHandle<()> {
        let path = self.path.clone();
        let last_seen = Arc::clone(&self.last_seen);
        let external = self.external.clone();
        handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let current = stamp_of(&path);
                let changed = {
                    let mut seen = last_seen.lock().unwrap_or_else(PoisonError::into_inner);
                    if *seen == current {
                        false
                    } else {
                        *seen = current;
                        true
                    }
                };
                if changed {
                    tracing::debug!(path = %path.display(), "storage changed by another process");
                    external.publish();
                }
            }
        })
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(error) => return Err(error.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(map) => Ok(map),
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "storage file malformed; treating as empty");
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let rendered = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, rendered)?;
        fs::rename(&tmp, &self.path)?;
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = stamp_of(&self.path);
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.read_map()?;
        map.insert(key.to_owned(), value.to_owned());
        self.write_map(&map)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.read_map()?;
        if map.remove(key).is_none() {
            return Ok(());
        }
        self.write_map(&map)
    }

    fn external_changes(&self) -> Notifier {
        self.external.clone()
    }
}

fn stamp_of(path: &Path) -> Stamp {
    let meta = fs::metadata(path).ok()?;
    Some((meta.modified().ok()?, meta.len()))
}
