//! Evaluation Context
//!
//! Every selector evaluation receives a [`GetContext`]. It is the only way an
//! evaluation reads other nodes, and every read through it records a
//! dependency edge (evaluating node → read node) before the value is handed
//! back. That is how the graph is discovered at runtime without anything
//! being declared up front.
//!
//! # Implementation
//!
//! The context is an explicit object rather than ambient thread-local state:
//! it carries a weak handle to the store, the key of the node being
//! evaluated and the generation of that evaluation. Edges reported by an
//! evaluation that has been superseded in the meantime are dropped by the
//! store, so a slow, outdated evaluation can never corrupt the edge set of
//! its replacement.
//!
//! The handle is weak so that a pending evaluation stored inside the graph
//! does not keep the graph alive. Reads after the store is gone reject with
//! [`NodeError::StoreDropped`].

use std::sync::Weak;

use serde::Serialize;

use super::{Atom, Loadable, Selector, SelectorFamily};
use crate::error::NodeError;
use crate::graph::node::downcast;
use crate::graph::{NodeKey, Store, StoreInner};

/// Dependency-tracking handle passed to selector evaluations.
#[derive(Clone)]
pub struct GetContext {
    store: Weak<StoreInner>,
    reader: NodeKey,
    generation: u64,
}

impl GetContext {
    pub(crate) fn new(store: Weak<StoreInner>, reader: NodeKey, generation: u64) -> Self {
        Self {
            store,
            reader,
            generation,
        }
    }

    /// A context that is not attached to any store.
    #[cfg(test)]
    pub(crate) fn detached(reader: NodeKey, generation: u64) -> Self {
        Self::new(Weak::new(), reader, generation)
    }

    /// Key of the node being evaluated.
    pub fn reader(&self) -> &NodeKey {
        &self.reader
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn store(&self) -> Result<Store, NodeError> {
        self.store
            .upgrade()
            .map(Store::from_inner)
            .ok_or(NodeError::StoreDropped)
    }

    pub(crate) fn weak_store(&self) -> Weak<StoreInner> {
        Weak::clone(&self.store)
    }

    /// Read an atom and depend on it.
    pub fn get_atom<T>(&self, atom: &Atom<T>) -> Result<T, NodeError>
    where
        T: Clone + Send + Sync + 'static,
    {
        Ok(self.store()?.read_atom_tracked(atom, self))
    }

    /// Read a selector and depend on it, suspending until it settles.
    ///
    /// A rejection of the selector is returned as this read's error, so `?`
    /// propagates it to the evaluating node.
    pub async fn get<T>(&self, selector: &Selector<T>) -> Result<T, NodeError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let load = {
            let store = self.store()?;
            store.track(selector, self);
            store.load(selector)
        };
        let value = load
            .outcome(self.weak_store(), selector.key().clone())
            .await?;
        Ok(downcast(selector.key(), &value))
    }

    /// Read one instance of a selector family and depend on it.
    pub async fn get_family<P, T>(
        &self,
        family: &SelectorFamily<P, T>,
        param: P,
    ) -> Result<T, NodeError>
    where
        P: Serialize + Clone + Send + Sync + 'static,
        T: Clone + Send + Sync + 'static,
    {
        self.get(&family.at(param)).await
    }

    /// Read a selector without waiting for it.
    ///
    /// Records the dependency like [`get`](Self::get). If the selector is
    /// still pending, the evaluating node is invalidated once it settles, so
    /// a partial result never outlives the straggler.
    pub fn peek<T>(&self, selector: &Selector<T>) -> Result<Loadable<T>, NodeError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let store = self.store()?;
        store.track(selector, self);
        let loadable = store.read(selector);
        if loadable.is_pending() {
            store.watch(selector.key(), self);
        }
        Ok(loadable)
    }
}

impl std::fmt::Debug for GetContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GetContext")
            .field("reader", &self.reader)
            .field("generation", &self.generation)
            .field("attached", &(self.store.strong_count() > 0))
            .finish()
    }
}
