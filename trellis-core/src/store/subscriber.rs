//! Change subscribers.
//!
//! Collaborators (rendering layers, form bridges) observe the store through
//! listeners registered here. Every mutating store operation calls
//! [`Subscribers::notify`] after committing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::model::{NodeId, RuleId};

/// Unique identifier for a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// What changed in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    NodeRegistered(NodeId),
    /// Fired for caller updates and for every write an effect commits.
    NodeUpdated(NodeId),
    NodeRemoved(NodeId),
    RuleAdded(RuleId),
    RuleRemoved(RuleId),
    /// Nodes, rules and dependency edges were all cleared.
    Reset,
}

/// A change listener.
pub type Listener = Arc<dyn Fn(&Change) + Send + Sync>;

type Registry = Mutex<IndexMap<SubscriberId, Listener>>;

/// The listener registry.
#[derive(Default)]
pub struct Subscribers {
    registry: Arc<Registry>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered while the returned
    /// [`Subscription`] is alive.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Change) + Send + Sync + 'static,
    {
        let id = SubscriberId::new();
        self.registry.lock().insert(id, Arc::new(listener));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Invoke every listener, in subscription order.
    pub fn notify(&self, change: &Change) {
        // Release the lock before calling out so listeners may (un)subscribe.
        let listeners: Vec<Listener> = self.registry.lock().values().cloned().collect();

        for listener in listeners {
            listener(change);
        }
    }

    pub fn len(&self) -> usize {
        self.registry.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.lock().is_empty()
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.len())
            .finish()
    }
}

/// Handle to a registered listener.
///
/// Dropping this handle unsubscribes the listener.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    id: SubscriberId,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Remove the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the listener registered for as long as the store lives.
    pub fn detach(mut self) {
        self.registry = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().shift_remove(&self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
