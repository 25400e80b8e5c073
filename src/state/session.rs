//! Session watch: the UI-facing binding over the snapshot reader.
//!
//! SYSTEM CONTEXT
//! ==============
//! A mounted [`SessionWatch`] listens to two triggers: the in-process auth
//! change notifier and the storage backend's "changed by another context"
//! signal. Either trigger re-reads the snapshot and notifies every watch
//! listener, whether or not the value moved; identity stability comes from
//! the reader, not from suppressing notifications.
//!
//! HYDRATION
//! =========
//! `hydrated` starts `false` and flips to `true` exactly once, on an idle
//! callback scheduled at mount. Until then consumers must treat the session
//! as unknown and make no routing decisions. Dropping the watch cancels a
//! pending hydration.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use super::notifier::{Notifier, Subscription};
use super::snapshot::{SessionSnapshot, SnapshotReader};
use crate::net::types::CachedUser;

/// Delay used when no idle-callback facility exists.
pub const HYDRATION_FALLBACK_DELAY: Duration = Duration::from_millis(200);

// =============================================================================
// SCHEDULING
// =============================================================================

/// Handle to a scheduled callback.
#[must_use = "keep the task to be able to cancel it"]
pub struct ScheduledTask {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl ScheduledTask {
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self { cancel: Some(Box::new(cancel)) }
    }

    /// A task with nothing to cancel.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    /// Prevent the callback from running if it has not run yet.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Low-priority, cancellable callback scheduling.
pub trait IdleScheduler: Send + Sync {
    fn schedule(&self, task: Box<dyn FnOnce() + Send>) -> ScheduledTask;
}

/// Tokio-backed scheduler. There is no idle signal outside a browser, so
/// callbacks run after a fixed delay.
#[derive(Clone, Debug)]
pub struct TokioIdleScheduler {
    handle: tokio::runtime::Handle,
    delay: Duration,
}

impl TokioIdleScheduler {
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle, delay: HYDRATION_FALLBACK_DELAY }
    }

    /// Scheduler on the ambient runtime; `None` outside one.
    #[must_use]
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl IdleScheduler for TokioIdleScheduler {
    fn schedule(&self, task: Box<dyn FnOnce() + Send>) -> ScheduledTask {
        let delay = self.delay;
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        ScheduledTask::new(move || join.abort())
    }
}

// =============================================================================
// WATCH
// =============================================================================

/// Value exposed to consumers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionView {
    pub authenticated: bool,
    pub user: Option<CachedUser>,
    pub hydrated: bool,
}

impl SessionView {
    /// Authenticated and safe to act on.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.hydrated && self.authenticated
    }

    /// Hydrated and known to be signed out.
    #[must_use]
    pub fn should_redirect_to_sign_in(&self) -> bool {
        self.hydrated && !self.authenticated
    }
}

struct WatchShared {
    reader: Arc<SnapshotReader>,
    snapshot: Mutex<Arc<SessionSnapshot>>,
    hydrated: AtomicBool,
    listeners: Notifier,
}

impl WatchShared {
    /// Re-read under the snapshot lock, so concurrent triggers store their
    /// results in the order they read them.
    fn reread(&self) {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        *snapshot = self.reader.read();
    }

    fn refresh(&self) {
        self.reread();
        self.listeners.publish();
    }

    fn hydrate(&self) {
        if !self.hydrated.swap(true, Ordering::SeqCst) {
            tracing::debug!("session hydrated");
            self.listeners.publish();
        }
    }
}

pub struct SessionWatch {
    shared: Arc<WatchShared>,
    _auth: Subscription,
    _storage: Option<Subscription>,
    hydration: Option<ScheduledTask>,
}

impl SessionWatch {
    /// Subscribe to both change triggers and schedule hydration.
    pub fn mount(reader: Arc<SnapshotReader>, scheduler: &dyn IdleScheduler) -> Self {
        let auth_notifier = reader.store().notifier().clone();
        let external = reader.store().storage().map(|storage| storage.external_changes());
        let initial = reader.last();
        let shared = Arc::new(WatchShared {
            reader,
            snapshot: Mutex::new(initial),
            hydrated: AtomicBool::new(false),
            listeners: Notifier::new(),
        });

        let weak = Arc::downgrade(&shared);
        let on_change = move || {
            if let Some(shared) = weak.upgrade() {
                shared.refresh();
            }
        };
        let auth = auth_notifier.subscribe(on_change.clone());
        let storage = external.map(|notifier| notifier.subscribe(on_change));
        // First read after subscribing; a change racing mount is not lost.
        shared.reread();

        let weak: Weak<WatchShared> = Arc::downgrade(&shared);
        let hydration = scheduler.schedule(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.hydrate();
            }
        }));

        Self { shared, _auth: auth, _storage: storage, hydration: Some(hydration) }
    }

    #[must_use]
    pub fn current(&self) -> SessionView {
        let snapshot = self.snapshot();
        SessionView {
            authenticated: snapshot.authenticated,
            user: snapshot.user.clone(),
            hydrated: self.is_hydrated(),
        }
    }

    /// Snapshot as of the last trigger; identity changes only with value.
    #[must_use]
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        Arc::clone(&self.shared.snapshot.lock().unwrap_or_else(PoisonError::into_inner))
    }

    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        self.shared.hydrated.load(Ordering::SeqCst)
    }

    /// Called after every trigger and once on hydration.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.listeners.subscribe(callback)
    }
}

impl Drop for SessionWatch {
    fn drop(&mut self) {
        if let Some(task) = self.hydration.take() {
            if !self.is_hydrated() {
                tracing::trace!("cancelling pending hydration");
            }
            task.cancel();
        }
    }
}
