//! Graph Nodes
//!
//! This module defines the nodes that live in the dependency graph: one per
//! atom and one per selector instance (plain or family), addressed by a
//! [`NodeKey`].
//!
//! # Cache Entry States
//!
//! A selector node walks through
//! `Uninitialized → Pending → (Resolved | Rejected) → Stale → Pending → …`.
//! `Stale` is only entered from a settled state through an invalidating write.
//! A `Pending` node that is invalidated keeps running for the readers already
//! waiting on it; it is flagged, and the next read starts a new generation.
//! If nobody reads it again, the flag turns the settled result stale.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use futures_util::future::{BoxFuture, Shared};
use indexmap::IndexSet;

use crate::error::{GraphError, NodeError};
use crate::reactive::GetContext;

/// Type-erased node value.
pub(crate) type Value = Arc<dyn Any + Send + Sync>;

/// What an evaluation settles to.
pub(crate) type Outcome = Result<Value, NodeError>;

/// The single in-flight evaluation of a node, shared by every reader.
pub(crate) type EvalFuture = Shared<BoxFuture<'static, Outcome>>;

/// The erased evaluation function of a selector.
pub(crate) type EvalFn = Arc<dyn Fn(GetContext) -> BoxFuture<'static, Outcome> + Send + Sync>;

/// Identity of a node: its declared name, plus the canonical parameter for
/// family instances.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    name: Arc<str>,
    param: Option<Arc<str>>,
}

impl NodeKey {
    /// Key of an atom or plain selector.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            param: None,
        }
    }

    /// Key of a family instance. `param` is the canonical form of the
    /// parameter; two keys are equal iff both parts are equal.
    pub fn with_param(name: impl Into<Arc<str>>, param: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            param: Some(param.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param(&self) -> Option<&str> {
        self.param.as_deref()
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.param {
            Some(param) => write!(f, "{}({})", self.name, param),
            None => f.write_str(&self.name),
        }
    }
}

/// Anything the store can address: atoms and selectors.
pub trait GraphNode {
    fn key(&self) -> &NodeKey;

    fn kind(&self) -> NodeKind;
}

/// The kind of node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A root value. Has dependents, never dependencies.
    Atom,

    /// A derived, cached value. Has both.
    Selector,
}

/// Observable state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Never evaluated.
    Uninitialized,

    /// An evaluation is in flight.
    Pending,

    /// Holds a value.
    Resolved,

    /// Holds a rejection.
    Rejected,

    /// A dependency changed since the last evaluation.
    Stale,
}

pub(crate) enum Slot {
    Atom(Value),
    Uninitialized,
    Pending {
        future: EvalFuture,
        invalidated: bool,
    },
    Resolved(Value),
    Rejected(NodeError),
    Stale,
}

/// A node in the dependency graph.
pub(crate) struct Node {
    kind: NodeKind,
    type_id: TypeId,
    type_name: &'static str,
    slot: Slot,
    eval: Option<EvalFn>,

    /// Bumped every time an evaluation starts; results and edges from older
    /// evaluations are discarded.
    generation: u64,
    evaluations: u64,

    /// Nodes this node read during its last evaluation.
    dependencies: IndexSet<NodeKey>,

    /// Nodes that read this node during their last evaluation.
    dependents: IndexSet<NodeKey>,

    /// Evaluations (node, generation) that observed this node while it was
    /// pending without waiting for it. They are invalidated when it settles.
    watchers: IndexSet<(NodeKey, u64)>,
}

impl Node {
    /// Create an atom node holding `value`.
    pub fn atom<T: Send + Sync + 'static>(value: T) -> Self {
        Self::new::<T>(NodeKind::Atom, Slot::Atom(Arc::new(value)), None)
    }

    /// Create a selector node that has not been evaluated yet.
    pub fn selector<T: 'static>(eval: EvalFn) -> Self {
        Self::new::<T>(NodeKind::Selector, Slot::Uninitialized, Some(eval))
    }

    fn new<T: 'static>(kind: NodeKind, slot: Slot, eval: Option<EvalFn>) -> Self {
        Self {
            kind,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            slot,
            eval,
            generation: 0,
            evaluations: 0,
            dependencies: IndexSet::new(),
            dependents: IndexSet::new(),
            watchers: IndexSet::new(),
        }
    }

    /// Panic unless this node was declared with the same kind and type.
    pub fn check<T: 'static>(&self, key: &NodeKey, kind: NodeKind) {
        if self.kind != kind || self.type_id != TypeId::of::<T>() {
            panic!(
                "{}",
                GraphError::TypeMismatch {
                    key: key.to_string(),
                    declared: format!("{:?}<{}>", self.kind, self.type_name),
                    requested: format!("{:?}<{}>", kind, type_name::<T>()),
                }
            );
        }
    }

    pub fn state(&self) -> EntryState {
        match self.slot {
            Slot::Atom(_) | Slot::Resolved(_) => EntryState::Resolved,
            Slot::Uninitialized => EntryState::Uninitialized,
            Slot::Pending { .. } => EntryState::Pending,
            Slot::Rejected(_) => EntryState::Rejected,
            Slot::Stale => EntryState::Stale,
        }
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Current atom value. `None` for selectors.
    pub fn atom_value(&self) -> Option<&Value> {
        match &self.slot {
            Slot::Atom(value) => Some(value),
            _ => None,
        }
    }

    pub fn set_atom_value(&mut self, value: Value) {
        debug_assert_eq!(self.kind, NodeKind::Atom);
        self.slot = Slot::Atom(value);
    }

    /// Begin a new evaluation. The caller has already checked that the entry
    /// is `Uninitialized`, `Stale`, or pending but invalidated.
    ///
    /// A superseded pending future keeps running for the readers holding it;
    /// its outcome no longer matches the generation and is dropped.
    ///
    /// `make_ctx` receives the new generation. The returned future has not
    /// been polled, so the evaluation function has not run yet.
    pub fn begin(&mut self, make_ctx: impl FnOnce(u64) -> GetContext) -> (EvalFuture, u64) {
        use futures_util::FutureExt;

        self.generation += 1;
        self.evaluations += 1;

        let eval = self
            .eval
            .clone()
            .expect("only selector nodes are evaluated");
        let ctx = make_ctx(self.generation);
        let future = async move { eval(ctx).await }.boxed().shared();

        self.slot = Slot::Pending {
            future: future.clone(),
            invalidated: false,
        };
        (future, self.generation)
    }

    /// Store the outcome of the current evaluation.
    ///
    /// Returns `true` if the entry was invalidated while pending and is
    /// therefore stale already.
    pub fn settle(&mut self, outcome: Outcome) -> bool {
        let invalidated = matches!(self.slot, Slot::Pending { invalidated: true, .. });
        self.slot = match outcome {
            _ if invalidated => Slot::Stale,
            Ok(value) => Slot::Resolved(value),
            Err(err) => Slot::Rejected(err),
        };
        invalidated
    }

    /// Mark the entry stale after an upstream change.
    ///
    /// Returns `true` if the state changed. A pending entry is only flagged.
    pub fn invalidate(&mut self) -> bool {
        if matches!(self.slot, Slot::Resolved(_) | Slot::Rejected(_)) {
            self.slot = Slot::Stale;
            return true;
        }
        if let Slot::Pending { invalidated, .. } = &mut self.slot {
            *invalidated = true;
        }
        false
    }

    pub fn add_dependency(&mut self, key: NodeKey) {
        self.dependencies.insert(key);
    }

    pub fn dependencies(&self) -> &IndexSet<NodeKey> {
        &self.dependencies
    }

    pub fn take_dependencies(&mut self) -> IndexSet<NodeKey> {
        std::mem::take(&mut self.dependencies)
    }

    pub fn add_dependent(&mut self, key: NodeKey) {
        self.dependents.insert(key);
    }

    pub fn remove_dependent(&mut self, key: &NodeKey) {
        self.dependents.shift_remove(key);
    }

    pub fn dependents(&self) -> &IndexSet<NodeKey> {
        &self.dependents
    }

    pub fn add_watcher(&mut self, key: NodeKey, generation: u64) {
        self.watchers.insert((key, generation));
    }

    pub fn take_watchers(&mut self) -> IndexSet<(NodeKey, u64)> {
        std::mem::take(&mut self.watchers)
    }
}

/// Clone the concrete value out of an erased one.
pub(crate) fn downcast<T: Clone + 'static>(key: &NodeKey, value: &Value) -> T {
    match value.downcast_ref::<T>() {
        Some(value) => value.clone(),
        None => panic!(
            "{}",
            GraphError::TypeMismatch {
                key: key.to_string(),
                declared: "a different type".to_string(),
                requested: type_name::<T>().to_string(),
            }
        ),
    }
}
