//! Atom Implementation
//!
//! An Atom is the root of the reactive graph. It names a slot holding a
//! value and declares the value the slot starts with.
//!
//! # How Atoms Work
//!
//! 1. An atom is declared once, ahead of time, with a unique key and a
//!    default value. The declaration itself holds no state.
//!
//! 2. The first time a store sees the atom (read or write), the store
//!    creates its node with the default value.
//!
//! 3. When a selector reads the atom through its [`GetContext`], an edge is
//!    recorded. Writing the atom marks every such selector stale.
//!
//! Reading an atom never recomputes anything and never fails.
//!
//! [`GetContext`]: super::GetContext

use std::fmt::Debug;
use std::sync::Arc;

use crate::graph::{GraphNode, NodeKey, NodeKind};

/// A mutable root node holding a value of type `T`.
///
/// # Example
///
/// ```rust
/// use atomgraph_core::{Atom, Store};
///
/// let count = Atom::new("count", 0);
/// let store = Store::new();
///
/// assert_eq!(store.read_atom(&count), 0);
/// store.write_atom(&count, 5);
/// assert_eq!(store.read_atom(&count), 5);
/// ```
pub struct Atom<T> {
    key: NodeKey,
    default: Arc<T>,
}

impl<T> Atom<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Declare an atom with the given key and default value.
    pub fn new(key: impl Into<Arc<str>>, default: T) -> Self {
        Self {
            key: NodeKey::named(key),
            default: Arc::new(default),
        }
    }

    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    /// The value a store starts this atom with.
    pub fn default_value(&self) -> T {
        T::clone(&self.default)
    }
}

impl<T> GraphNode for Atom<T> {
    fn key(&self) -> &NodeKey {
        &self.key
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Atom
    }
}

impl<T> Clone for Atom<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            default: Arc::clone(&self.default),
        }
    }
}

impl<T: Debug> Debug for Atom<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Atom")
            .field("key", &self.key)
            .field("default", &self.default)
            .finish()
    }
}
