//! Dependency Graph
//!
//! This module implements the value graph that connects atoms and selectors.
//!
//! # Overview
//!
//! The graph is a directed acyclic graph where:
//!
//! - Nodes are atoms (roots holding a value) or selector instances (cached
//!   derived values, possibly asynchronous, possibly one of many instances of
//!   a parameterized family)
//! - Edges are dependencies: if selector A read B during its last
//!   evaluation, there is an edge from B to A
//!
//! Edges are not declared. They are discovered while evaluations run, and
//! replaced every time a selector evaluates again.
//!
//! # Design Decisions
//!
//! 1. One explicit [`Store`] owns the whole graph. There is no global
//!    registry, so independent stores (one per test, one per app root) never
//!    interfere.
//!
//! 2. The graph is indexed by [`NodeKey`] for O(1) lookups. A family
//!    instance's key includes its parameter, compared by value.
//!
//! 3. Both forward (dependencies) and reverse (dependents) edges are kept:
//!    the reverse edges drive invalidation, the forward ones are cleared on
//!    re-evaluation and used for cycle detection.

mod aggregate;
mod deps;
pub(crate) mod node;
mod store;

pub use aggregate::AggregateMode;
pub use node::{EntryState, GraphNode, NodeKey, NodeKind};
pub use store::Store;

pub(crate) use store::StoreInner;
