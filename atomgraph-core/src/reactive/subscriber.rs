//! Subscriber types for the graph.
//!
//! A Subscriber is an external observer of one node, typically a view that
//! needs to re-render when the node changes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::graph::NodeKey;

/// Unique identifier for a subscriber.
///
/// Returned by [`Store::subscribe`](crate::Store::subscribe) and used to
/// unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
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

/// A callback attached to one node.
///
/// It is invoked when the node's atom value is written, its selector
/// evaluation settles, or it is invalidated.
#[derive(Clone)]
pub struct Subscriber {
    id: SubscriberId,
    key: NodeKey,
    notify: Arc<dyn Fn() + Send + Sync>,
}

impl Subscriber {
    /// Create a new subscriber to `key` with the given notification callback.
    pub fn new<F>(key: NodeKey, notify: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            id: SubscriberId::new(),
            key,
            notify: Arc::new(notify),
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// The node this subscriber watches.
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    pub fn notify(&self) {
        (self.notify)();
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("key", &self.key)
            .finish()
    }
}
