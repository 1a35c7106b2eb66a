//! Subscriber-based notifications for configuration changes.

use crate::core::ConfigSnapshot;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

type Callback = Arc<dyn Fn(&ConfigSnapshot) + Send + Sync>;
type CountListener = Arc<dyn Fn(usize) + Send + Sync>;

/// Handle for a subscription that can be dropped to unsubscribe.
///
/// When the handle is dropped, the subscription is removed immediately.
pub struct SubscriptionHandle {
    id: usize,
    registry: Weak<Mutex<SubscriberRegistryInner>>,
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let id = self.id;
            let (count, listener) = {
                let mut inner = registry.lock();
                inner.subscribers.retain(|(sub_id, _)| *sub_id != id);
                (inner.subscribers.len(), inner.on_count_change.clone())
            };
            if let Some(listener) = listener {
                listener(count);
            }
        }
    }
}

/// Internal subscriber registry state.
struct SubscriberRegistryInner {
    subscribers: Vec<(usize, Callback)>,
    next_id: usize,
    on_count_change: Option<CountListener>,
}

/// Registry for managing configuration change subscribers.
///
/// Callbacks receive every snapshot the store installs, in order.
///
/// # Examples
///
/// ```rust
/// use strata_config::notify::SubscriberRegistry;
///
/// let registry = SubscriberRegistry::new();
///
/// let handle = registry.subscribe(|snapshot| {
///     println!("Config changed to version {}", snapshot.version());
/// });
/// assert_eq!(registry.subscriber_count(), 1);
///
/// // Unsubscribe by dropping the handle
/// drop(handle);
/// assert_eq!(registry.subscriber_count(), 0);
/// ```
pub struct SubscriberRegistry {
    inner: Arc<Mutex<SubscriberRegistryInner>>,
}

impl SubscriberRegistry {
    /// Create a new subscriber registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SubscriberRegistryInner {
                subscribers: Vec::new(),
                next_id: 0,
                on_count_change: None,
            })),
        }
    }

    /// Subscribe to configuration changes.
    ///
    /// Returns a handle that can be dropped to unsubscribe.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&ConfigSnapshot) + Send + Sync + 'static,
    {
        let (id, count, listener) = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push((id, Arc::new(callback)));
            (id, inner.subscribers.len(), inner.on_count_change.clone())
        };
        if let Some(listener) = listener {
            listener(count);
        }

        SubscriptionHandle {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Call `listener` with the new subscriber count whenever a subscription
    /// is added or a handle is dropped. Replaces any previous listener.
    pub fn on_count_change<F>(&self, listener: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.inner.lock().on_count_change = Some(Arc::new(listener));
    }

    /// Notify all subscribers of a new snapshot, in subscription order.
    ///
    /// Callbacks run outside the registry lock, so they may subscribe or
    /// unsubscribe without deadlocking.
    pub fn notify_all(&self, snapshot: &ConfigSnapshot) {
        let callbacks: Vec<Callback> = self
            .inner
            .lock()
            .subscribers
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(snapshot);
        }
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SubscriberRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
