//! Graph Store
//!
//! The store is the central coordinator that connects atoms and selectors.
//! It owns every node, the dependency edges between them and the subscriber
//! list. There is no global registry: the application root creates a store
//! and passes it (or clones of it, which share state) to whoever needs graph
//! access.
//!
//! # How It Works
//!
//! 1. Reading an atom returns its value, initialising it with the declared
//!    default on first use.
//!
//! 2. Reading a selector returns the cached outcome if there is one.
//!    Otherwise a new evaluation starts and is polled once, right away. If it
//!    finishes on that first poll (a synchronous selector, or an async one
//!    whose inputs are all settled) the read reports the outcome directly;
//!    otherwise the read reports `Pending` and a task on the current tokio
//!    runtime drives the evaluation to completion.
//!
//! 3. While a selector is pending, every other read of it gets the same
//!    shared future. One evaluation per entry, however many readers. A write
//!    upstream of a pending selector makes the next read start over.
//!
//! 4. Writing an atom walks the reverse edges and marks every transitive
//!    dependent stale. Nothing recomputes until it is read again.
//!
//! # Locking
//!
//! All graph state sits behind one mutex. A write and its whole invalidation
//! walk happen in one critical section, as do settling and edge recording,
//! so no evaluation ever observes a partially invalidated graph. User code
//! (evaluation functions, subscriber callbacks) never runs with the lock
//! held.

use std::sync::{Arc, Weak};

use futures_util::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;

use super::deps::DependencyGraph;
use super::node::{
    downcast, EntryState, EvalFuture, GraphNode, Node, NodeKey, NodeKind, Outcome, Slot,
};
use crate::error::{GraphError, NodeError};
use crate::reactive::{Atom, GetContext, Loadable, Selector, SelectorFamily, Subscriber, SubscriberId};

pub(crate) struct StoreInner {
    graph: Mutex<DependencyGraph>,
    subscribers: Mutex<Vec<Subscriber>>,
}

/// Holds the values of one reactive graph.
///
/// Cloning a store is cheap and the clones share state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

/// Result of asking for a selector's outcome without blocking.
pub(crate) enum Load {
    Ready(Outcome),
    Pending { future: EvalFuture, generation: u64 },
}

impl Load {
    /// Wait for the outcome.
    ///
    /// Whoever observes completion first stores it, so a dependent never
    /// continues before its dependency is settled in the graph.
    pub(crate) async fn outcome(self, store: Weak<StoreInner>, key: NodeKey) -> Outcome {
        match self {
            Load::Ready(outcome) => outcome,
            Load::Pending { future, generation } => {
                let outcome = future.await;
                if let Some(inner) = store.upgrade() {
                    Store::from_inner(inner).finish(&key, generation, outcome.clone());
                }
                outcome
            }
        }
    }
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::from_inner(Arc::new(StoreInner {
            graph: Mutex::new(DependencyGraph::new()),
            subscribers: Mutex::new(Vec::new()),
        }))
    }

    pub(crate) fn from_inner(inner: Arc<StoreInner>) -> Self {
        Self { inner }
    }

    fn downgrade(&self) -> Weak<StoreInner> {
        Arc::downgrade(&self.inner)
    }

    // ------------------------------------------------------------------------
    // Atoms
    // ------------------------------------------------------------------------

    /// Current value of an atom. Never suspends, never fails.
    ///
    /// # Panics
    ///
    /// If the atom's key was already declared with another type.
    pub fn read_atom<T>(&self, atom: &Atom<T>) -> T
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut graph = self.inner.graph.lock();
        current_value(declare_atom(&mut graph, atom), atom.key())
    }

    /// Store a new value and mark every selector that depends on the atom
    /// stale. Returns without recomputing anything.
    pub fn write_atom<T>(&self, atom: &Atom<T>, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        self.replace_atom(atom, |_| value);
    }

    /// Replace an atom's value with `f(current)`.
    ///
    /// `f` runs while the graph is locked and must not use the store.
    pub fn update_atom<T, F>(&self, atom: &Atom<T>, f: F)
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(&T) -> T,
    {
        self.replace_atom(atom, |current| f(&current));
    }

    fn replace_atom<T, F>(&self, atom: &Atom<T>, make: F)
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> T,
    {
        let changed = {
            let mut graph = self.inner.graph.lock();
            let node = declare_atom(&mut graph, atom);
            let next = make(current_value(node, atom.key()));
            node.set_atom_value(Arc::new(next));

            let mut changed = vec![atom.key().clone()];
            changed.extend(graph.invalidate_dependents(atom.key()));
            changed
        };
        tracing::debug!(atom = %atom.key(), invalidated = changed.len() - 1, "atom written");
        self.notify(&changed);
    }

    pub(crate) fn read_atom_tracked<T>(&self, atom: &Atom<T>, reader: &GetContext) -> T
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut graph = self.inner.graph.lock();
        let value = current_value(declare_atom(&mut graph, atom), atom.key());
        if is_current(&graph, reader) {
            graph.add_edge(atom.key(), reader.reader());
            tracing::trace!(reader = %reader.reader(), dependency = %atom.key(), "edge recorded");
        }
        value
    }

    // ------------------------------------------------------------------------
    // Selectors
    // ------------------------------------------------------------------------

    /// Read a selector without suspending.
    ///
    /// Returns the cached outcome when the entry is fresh. Otherwise starts
    /// an evaluation (or joins the one in flight) and reports `Pending`
    /// unless it completes immediately.
    ///
    /// # Panics
    ///
    /// If the selector's key was already declared with another type, or if
    /// its evaluation reads itself.
    pub fn read<T>(&self, selector: &Selector<T>) -> Loadable<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        match self.load(selector) {
            Load::Ready(Ok(value)) => Loadable::Resolved(downcast(selector.key(), &value)),
            Load::Ready(Err(err)) => Loadable::Rejected(err),
            Load::Pending { .. } => Loadable::Pending,
        }
    }

    /// Read one instance of a selector family. Instances with different
    /// parameters never share a cache entry.
    pub fn read_family<P, T>(&self, family: &SelectorFamily<P, T>, param: P) -> Loadable<T>
    where
        P: Serialize + Clone + Send + Sync + 'static,
        T: Clone + Send + Sync + 'static,
    {
        self.read(&family.at(param))
    }

    /// Read a selector, suspending until it settles.
    pub async fn resolve<T>(&self, selector: &Selector<T>) -> Result<T, NodeError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let value = self
            .load(selector)
            .outcome(self.downgrade(), selector.key().clone())
            .await?;
        Ok(downcast(selector.key(), &value))
    }

    /// Start evaluating a selector so its value is ready by the time it is
    /// needed. Returns the entry's state after the call.
    pub fn prefetch<T>(&self, selector: &Selector<T>) -> EntryState
    where
        T: Clone + Send + Sync + 'static,
    {
        let state = match self.load(selector) {
            Load::Ready(Ok(_)) => EntryState::Resolved,
            Load::Ready(Err(_)) => EntryState::Rejected,
            Load::Pending { .. } => EntryState::Pending,
        };
        tracing::debug!(node = %selector.key(), ?state, "prefetched");
        state
    }

    pub(crate) fn load<T>(&self, selector: &Selector<T>) -> Load
    where
        T: Clone + Send + Sync + 'static,
    {
        let key = selector.key();
        let (future, generation) = {
            let mut graph = self.inner.graph.lock();
            let node = declare_selector(&mut graph, selector);
            match node.slot() {
                Slot::Resolved(value) => return Load::Ready(Ok(value.clone())),
                Slot::Rejected(err) => return Load::Ready(Err(err.clone())),
                Slot::Pending {
                    future,
                    invalidated: false,
                } => {
                    return Load::Pending {
                        future: future.clone(),
                        generation: node.generation(),
                    }
                }
                Slot::Atom(_) => unreachable!("`{key}` was checked to be a selector"),
                // An evaluation invalidated mid-flight read its inputs before
                // the write; later readers need a fresh one.
                Slot::Uninitialized | Slot::Stale | Slot::Pending { invalidated: true, .. } => {}
            }

            let store = self.downgrade();
            let started = node.begin(|generation| GetContext::new(store, key.clone(), generation));
            graph.clear_dependencies(key);
            started
        };
        tracing::debug!(node = %key, generation, "evaluation started");

        // The evaluation function runs here, on the first poll, outside the lock.
        match future.clone().now_or_never() {
            Some(outcome) => {
                self.finish(key, generation, outcome.clone());
                Load::Ready(outcome)
            }
            None => {
                self.drive(key.clone(), generation, future.clone());
                Load::Pending { future, generation }
            }
        }
    }

    /// Keep a pending evaluation moving even if every reader goes away.
    fn drive(&self, key: NodeKey, generation: u64, future: EvalFuture) {
        match Handle::try_current() {
            Ok(handle) => {
                let task = Load::Pending { future, generation }.outcome(self.downgrade(), key);
                handle.spawn(task);
            }
            Err(_) => {
                tracing::warn!(node = %key, "no tokio runtime; evaluation only advances while awaited")
            }
        }
    }

    /// Store the outcome of evaluation `generation` of `key`.
    ///
    /// Outcomes of superseded evaluations and repeated deliveries are ignored.
    pub(crate) fn finish(&self, key: &NodeKey, generation: u64, outcome: Outcome) {
        let changed = {
            let mut graph = self.inner.graph.lock();
            let Some(node) = graph.get_mut(key) else {
                return;
            };
            if node.generation() != generation || node.state() != EntryState::Pending {
                return;
            }

            let rejected = outcome.is_err();
            let stale = node.settle(outcome);
            let watchers = node.take_watchers();
            tracing::debug!(node = %key, generation, rejected, stale, "evaluation settled");

            // A watcher re-evaluated since it looked no longer depends on what it saw.
            let watchers = watchers
                .into_iter()
                .filter(|(watcher, generation)| {
                    graph
                        .get(watcher)
                        .is_some_and(|node| node.generation() == *generation)
                })
                .map(|(watcher, _)| watcher)
                .collect();

            let mut changed = vec![key.clone()];
            changed.extend(graph.invalidate(watchers));
            changed
        };
        self.notify(&changed);
    }

    /// Record that the evaluation behind `reader` read `selector`.
    pub(crate) fn track<T>(&self, selector: &Selector<T>, reader: &GetContext)
    where
        T: Clone + Send + Sync + 'static,
    {
        let dependency = selector.key();
        let mut graph = self.inner.graph.lock();
        declare_selector(&mut graph, selector);
        if !is_current(&graph, reader) {
            return;
        }

        if dependency == reader.reader() || graph.reaches(dependency, reader.reader()) {
            drop(graph);
            panic!(
                "{}",
                GraphError::Cycle {
                    reader: reader.reader().to_string(),
                    dependency: dependency.to_string(),
                }
            );
        }

        graph.add_edge(dependency, reader.reader());
        tracing::trace!(reader = %reader.reader(), %dependency, "edge recorded");
    }

    /// Invalidate `reader` once `dependency` settles. Used by reads that saw
    /// `dependency` pending and did not wait for it.
    ///
    /// If it settled in the meantime, the reader's view is already partial
    /// and it is invalidated right away.
    pub(crate) fn watch(&self, dependency: &NodeKey, reader: &GetContext) {
        let changed = {
            let mut graph = self.inner.graph.lock();
            if !is_current(&graph, reader) {
                return;
            }
            if let Some(node) = graph
                .get_mut(dependency)
                .filter(|node| node.state() == EntryState::Pending)
            {
                node.add_watcher(reader.reader().clone(), reader.generation());
                tracing::trace!(reader = %reader.reader(), %dependency, "watching");
                return;
            }
            graph.invalidate(vec![reader.reader().clone()])
        };
        self.notify(&changed);
    }

    // ------------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------------

    /// Call `notify` whenever `node` changes: an atom is written, a selector
    /// settles, or a selector goes stale.
    ///
    /// The callback runs after the graph lock is released and may read the
    /// store.
    pub fn subscribe<N, F>(&self, node: &N, notify: F) -> SubscriberId
    where
        N: GraphNode,
        F: Fn() + Send + Sync + 'static,
    {
        let subscriber = Subscriber::new(node.key().clone(), notify);
        let id = subscriber.id();
        self.inner.subscribers.lock().push(subscriber);
        id
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.inner.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|subscriber| subscriber.id() != id);
        subscribers.len() != before
    }

    fn notify(&self, changed: &[NodeKey]) {
        let due: Vec<Subscriber> = self
            .inner
            .subscribers
            .lock()
            .iter()
            .filter(|subscriber| changed.contains(subscriber.key()))
            .cloned()
            .collect();

        for subscriber in due {
            subscriber.notify();
        }
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// State of a node's cache entry.
    pub fn state<N: GraphNode>(&self, node: &N) -> EntryState {
        match self.inner.graph.lock().get(node.key()) {
            Some(node) => node.state(),
            None if node.kind() == NodeKind::Atom => EntryState::Resolved,
            None => EntryState::Uninitialized,
        }
    }

    /// How many evaluations of `node` have been started.
    pub fn evaluation_count<N: GraphNode>(&self, node: &N) -> u64 {
        self.inner
            .graph
            .lock()
            .get(node.key())
            .map_or(0, Node::evaluations)
    }

    /// Nodes read by the last evaluation of `node`.
    pub fn dependencies<N: GraphNode>(&self, node: &N) -> Vec<NodeKey> {
        self.inner
            .graph
            .lock()
            .get(node.key())
            .map(|node| node.dependencies().iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Nodes whose last evaluation read `node`.
    pub fn dependents<N: GraphNode>(&self, node: &N) -> Vec<NodeKey> {
        self.inner
            .graph
            .lock()
            .get(node.key())
            .map(|node| node.dependents().iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of nodes declared so far.
    pub fn node_count(&self) -> usize {
        self.inner.graph.lock().node_count()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("node_count", &self.node_count())
            .field("subscriber_count", &self.inner.subscribers.lock().len())
            .finish()
    }
}

fn declare_atom<'g, T>(graph: &'g mut DependencyGraph, atom: &Atom<T>) -> &'g mut Node
where
    T: Clone + Send + Sync + 'static,
{
    let node = graph.declare(atom.key(), || Node::atom(atom.default_value()));
    node.check::<T>(atom.key(), NodeKind::Atom);
    node
}

fn declare_selector<'g, T>(graph: &'g mut DependencyGraph, selector: &Selector<T>) -> &'g mut Node
where
    T: Clone + Send + Sync + 'static,
{
    let node = graph.declare(selector.key(), || Node::selector::<T>(selector.eval().clone()));
    node.check::<T>(selector.key(), NodeKind::Selector);
    node
}

fn current_value<T: Clone + 'static>(node: &Node, key: &NodeKey) -> T {
    match node.atom_value() {
        Some(value) => downcast(key, value),
        None => unreachable!("`{key}` was checked to be an atom"),
    }
}

/// Whether `reader` is still the live evaluation of its node.
fn is_current(graph: &DependencyGraph, reader: &GetContext) -> bool {
    graph.get(reader.reader()).is_some_and(|node| {
        node.generation() == reader.generation() && node.state() == EntryState::Pending
    })
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        (count.clone(), count)
    }

    #[test]
    fn atom_reads_default_then_written_value() {
        let store = Store::new();
        let atom = Atom::new("count", 0);

        assert_eq!(store.read_atom(&atom), 0);
        store.write_atom(&atom, 42);
        assert_eq!(store.read_atom(&atom), 42);

        store.update_atom(&atom, |v| v + 1);
        assert_eq!(store.read_atom(&atom), 43);
    }

    #[test]
    fn clones_share_state() {
        let store = Store::new();
        let other = store.clone();
        let atom = Atom::new("shared", 1);

        store.write_atom(&atom, 2);
        assert_eq!(other.read_atom(&atom), 2);
    }

    #[test]
    fn resolved_selector_is_not_reevaluated() {
        let store = Store::new();
        let (count, seen) = counter();

        let selector = Selector::derived("answer", move |_ctx| {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(42)
        });

        assert_eq!(store.state(&selector), EntryState::Uninitialized);
        assert_eq!(store.read(&selector), Loadable::Resolved(42));
        assert_eq!(store.read(&selector), Loadable::Resolved(42));
        assert_eq!(store.read(&selector), Loadable::Resolved(42));

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(store.evaluation_count(&selector), 1);
    }

    #[test]
    fn write_invalidates_only_readers_of_the_atom() {
        let store = Store::new();
        let a = Atom::new("a", 1);
        let b = Atom::new("b", 10);

        let a_clone = a.clone();
        let reads_a = Selector::derived("reads_a", move |ctx| ctx.get_atom(&a_clone));
        let b_clone = b.clone();
        let reads_b = Selector::derived("reads_b", move |ctx| ctx.get_atom(&b_clone));

        store.read(&reads_a);
        store.read(&reads_b);

        store.write_atom(&a, 2);

        assert_eq!(store.state(&reads_a), EntryState::Stale);
        assert_eq!(store.state(&reads_b), EntryState::Resolved);

        assert_eq!(store.read(&reads_a), Loadable::Resolved(2));
        assert_eq!(store.evaluation_count(&reads_a), 2);
        assert_eq!(store.evaluation_count(&reads_b), 1);
    }

    #[test]
    fn edges_follow_the_last_evaluation() {
        let store = Store::new();
        let use_left = Atom::new("use_left", true);
        let left = Atom::new("left", "l");
        let right = Atom::new("right", "r");

        let (flag, l, r) = (use_left.clone(), left.clone(), right.clone());
        let pick = Selector::derived("pick", move |ctx| {
            if ctx.get_atom(&flag)? {
                ctx.get_atom(&l)
            } else {
                ctx.get_atom(&r)
            }
        });

        assert_eq!(store.read(&pick), Loadable::Resolved("l"));

        // `right` was not read, so writing it leaves the entry alone.
        store.write_atom(&right, "r2");
        assert_eq!(store.state(&pick), EntryState::Resolved);

        store.write_atom(&use_left, false);
        assert_eq!(store.read(&pick), Loadable::Resolved("r2"));

        // Now `left` is no longer a dependency.
        store.write_atom(&left, "l2");
        assert_eq!(store.state(&pick), EntryState::Resolved);
        assert_eq!(store.dependents(&left), Vec::<NodeKey>::new());
    }

    #[test]
    fn subscribers_hear_about_writes_and_staleness() {
        let store = Store::new();
        let atom = Atom::new("source", 1);
        let atom_clone = atom.clone();
        let derived = Selector::derived("derived", move |ctx| ctx.get_atom(&atom_clone));

        let (atom_hits, atom_seen) = counter();
        let (derived_hits, derived_seen) = counter();
        store.subscribe(&atom, move || {
            atom_hits.fetch_add(1, Ordering::SeqCst);
        });
        let id = store.subscribe(&derived, move || {
            derived_hits.fetch_add(1, Ordering::SeqCst);
        });

        // Settling counts as a change.
        store.read(&derived);
        assert_eq!(derived_seen.load(Ordering::SeqCst), 1);

        store.write_atom(&atom, 2);
        assert_eq!(atom_seen.load(Ordering::SeqCst), 1);
        assert_eq!(derived_seen.load(Ordering::SeqCst), 2);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.read(&derived);
        assert_eq!(derived_seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[should_panic(expected = "dependency cycle")]
    fn self_read_is_a_cycle() {
        let store = Store::new();
        let slot: Arc<parking_lot::Mutex<Option<Selector<i32>>>> = Arc::default();
        let slot_clone = slot.clone();
        let selector = Selector::new("ouroboros", move |ctx| {
            let me = slot_clone.lock().clone();
            async move {
                match me {
                    Some(me) => ctx.get(&me).await,
                    None => Ok(0),
                }
            }
        });
        *slot.lock() = Some(selector.clone());

        store.read(&selector);
    }

    #[test]
    #[should_panic(expected = "declared as")]
    fn key_reuse_with_other_type_panics() {
        let store = Store::new();
        store.read_atom(&Atom::new("dup", 1_i32));
        store.read_atom(&Atom::new("dup", String::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn async_selector_is_pending_until_it_resolves() {
        let store = Store::new();
        let selector = Selector::new("slow", |_ctx| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok("done".to_string())
        });

        assert_eq!(store.read(&selector), Loadable::Pending);
        assert_eq!(store.state(&selector), EntryState::Pending);

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(store.state(&selector), EntryState::Resolved);
        assert_eq!(store.read(&selector), Loadable::Resolved("done".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn pending_reads_share_one_evaluation() {
        let store = Store::new();
        let (count, seen) = counter();
        let selector = Selector::new("single", move |_ctx| {
            count.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(7)
            }
        });

        assert!(store.read(&selector).is_pending());
        assert!(store.read(&selector).is_pending());
        let (a, b) = tokio::join!(store.resolve(&selector), store.resolve(&selector));

        assert_eq!((a, b), (Ok(7), Ok(7)));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(store.evaluation_count(&selector), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn write_during_evaluation_restarts_it_for_later_readers() {
        let store = Store::new();
        let atom = Atom::new("input", 1);
        let atom_clone = atom.clone();
        let selector = Selector::new("echo", move |ctx| {
            let atom = atom_clone.clone();
            async move {
                let value = ctx.get_atom(&atom)?;
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(value)
            }
        });

        assert!(store.read(&selector).is_pending());
        let early = {
            let (store, selector) = (store.clone(), selector.clone());
            tokio::spawn(async move { store.resolve(&selector).await })
        };
        tokio::task::yield_now().await;

        store.write_atom(&atom, 2);
        assert_eq!(store.state(&selector), EntryState::Pending);

        // Readers arriving after the write get a fresh evaluation...
        assert_eq!(store.resolve(&selector).await, Ok(2));
        // ...while the one already waiting gets the outcome it waited for.
        assert_eq!(early.await.unwrap(), Ok(1));

        assert_eq!(store.evaluation_count(&selector), 2);
        assert_eq!(store.state(&selector), EntryState::Resolved);
        assert_eq!(store.read(&selector), Loadable::Resolved(2));
    }

    #[tokio::test(start_paused = true)]
    async fn dependent_of_a_restarted_evaluation_sees_the_write() {
        let store = Store::new();
        let x = Atom::new("x", 1);

        let x_clone = x.clone();
        let slow = Selector::new("slow", move |ctx| {
            let x = x_clone.clone();
            async move {
                let value = ctx.get_atom(&x)?;
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(value)
            }
        });
        let slow_clone = slow.clone();
        let scaled = Selector::new("scaled", move |ctx| {
            let slow = slow_clone.clone();
            async move { Ok(ctx.get(&slow).await? * 10) }
        });

        assert!(store.read(&slow).is_pending());
        store.write_atom(&x, 2);
        assert!(store.read(&scaled).is_pending());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.read(&scaled), Loadable::Resolved(20));
        assert_eq!(store.read(&slow), Loadable::Resolved(2));
    }

    #[tokio::test]
    async fn evaluation_outlives_its_reader() {
        let store = Store::new();
        let selector = Selector::new("background", |_ctx| async {
            tokio::task::yield_now().await;
            Ok(1)
        });

        // Read and walk away; the spawned driver still settles the entry.
        assert!(store.read(&selector).is_pending());
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(store.state(&selector), EntryState::Resolved);
    }
}
