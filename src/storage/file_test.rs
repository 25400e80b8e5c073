use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

fn temp_storage() -> (tempfile::TempDir, FileStorage) {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::in_dir(&dir.path().join("nested"));
    (dir, storage)
}

// =============================================================
// Key/value behavior
// =============================================================

#[test]
fn missing_file_reads_as_empty() {
    let (_dir, storage) = temp_storage();
    assert_eq!(storage.get_item("token").unwrap(), None);
}

#[test]
fn set_creates_parent_dirs_and_persists() {
    let (_dir, storage) = temp_storage();
    storage.set_item("token", "abc").unwrap();
    assert!(storage.path().exists());
    assert_eq!(storage.get_item("token").unwrap().as_deref(), Some("abc"));
}

#[test]
fn second_handle_sees_first_handle_writes() {
    let (_dir, storage) = temp_storage();
    let other = FileStorage::at(storage.path().to_path_buf());
    storage.set_item("user", "{}").unwrap();
    assert_eq!(other.get_item("user").unwrap().as_deref(), Some("{}"));
}

#[test]
fn remove_deletes_only_that_key() {
    let (_dir, storage) = temp_storage();
    storage.set_item("token", "abc").unwrap();
    storage.set_item("user", "{}").unwrap();
    storage.remove_item("token").unwrap();
    assert_eq!(storage.get_item("token").unwrap(), None);
    assert_eq!(storage.get_item("user").unwrap().as_deref(), Some("{}"));
}

#[test]
fn malformed_file_reads_as_empty_and_is_replaced_on_write() {
    let (_dir, storage) = temp_storage();
    fs::create_dir_all(storage.path().parent().unwrap()).unwrap();
    fs::write(storage.path(), "not json").unwrap();

    assert_eq!(storage.get_item("token").unwrap(), None);

    storage.set_item("token", "abc").unwrap();
    assert_eq!(storage.get_item("token").unwrap().as_deref(), Some("abc"));
}

// =============================================================
// Watching
// =============================================================

#[tokio::test]
async fn watch_fires_when_another_process_writes() {
    let (_dir, storage) = temp_storage();
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    let _sub = storage.external_changes().subscribe(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    let handle = storage.watch(Duration::from_millis(10)).unwrap();

    let other = FileStorage::at(storage.path().to_path_buf());
    other.set_item("token", "abc").unwrap();

    for _ in 0..100 {
        if count.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.abort();
    assert!(count.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn watch_ignores_own_writes() {
    let (_dir, storage) = temp_storage();
    storage.set_item("token", "abc").unwrap();
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);
    let _sub = storage.external_changes().subscribe(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let handle = storage.watch(Duration::from_millis(10)).unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    handle.abort();

    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn watch_outside_runtime_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::in_dir(dir.path());
    assert!(storage.watch(Duration::from_millis(10)).is_none());
}

#[test]
fn watch_on_explicit_runtime_outside_async_context() {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::in_dir(dir.path());

    let handle = storage.watch_on(runtime.handle(), Duration::from_millis(10));

    assert!(!handle.is_finished());
    handle.abort();
}
