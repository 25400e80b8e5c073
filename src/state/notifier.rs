//! Zero-payload change notifier.
//!
//! SYSTEM CONTEXT
//! ==============
//! Backs two signals: the in-process "auth changed" event raised by whoever
//! mutates the credential store, and the "changed by another context" event
//! raised by storage backends. Delivery is synchronous, in subscription
//! order, at most once per `publish`, with no history for late subscribers.

#[cfg(test)]
#[path = "notifier_test.rs"]
mod notifier_test;

use std::sync::{Arc, Mutex, PoisonError, Weak};

type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Callback)>,
}

/// Observer registry shared by every clone.
#[derive(Clone, Default)]
pub struct Notifier {
    inner: Arc<Mutex<Registry>>,
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback`; it stays registered until the returned
    /// [`Subscription`] is unsubscribed or dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id = registry.next_id.wrapping_add(1);
        registry.listeners.push((id, Arc::new(callback)));
        Subscription { registry: Arc::downgrade(&self.inner), id: Some(id) }
    }

    /// Invoke every current subscriber once.
    ///
    /// The registry lock is released before callbacks run, so a callback may
    /// subscribe, unsubscribe, or publish again.
    pub fn publish(&self) {
        let listeners: Vec<Callback> = {
            let registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            registry.listeners.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };
        tracing::trace!(subscribers = listeners.len(), "notifier publish");
        for callback in listeners {
            callback();
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).listeners.len()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").field("subscribers", &self.subscriber_count()).finish()
    }
}

/// Handle returned by [`Notifier::subscribe`]. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    id: Option<u64>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry.listeners.retain(|(listener_id, _)| *listener_id != id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish_non_exhaustive()
    }
}
