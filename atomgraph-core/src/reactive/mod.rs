//! Reactive Primitives
//!
//! This module declares the nodes of the graph: atoms, selectors, and
//! selector families. Declarations are plain handles holding a key and, for
//! selectors, the evaluation function. Values live in a
//! [`Store`](crate::Store).
//!
//! # Concepts
//!
//! ## Atoms
//!
//! An Atom is a root node holding mutable state. It is the only kind of node
//! that can be written. Writing it invalidates every selector that read it.
//!
//! ## Selectors
//!
//! A Selector is a derived value that caches its outcome. Its evaluation may
//! be asynchronous, and it may reject with a [`NodeError`](crate::NodeError).
//! It re-evaluates only when read after one of its dependencies changed.
//!
//! ## Families
//!
//! A SelectorFamily yields one selector per parameter value, each with its
//! own cache entry.
//!
//! # Implementation Notes
//!
//! Dependencies are discovered while the evaluation runs: every read made
//! through the [`GetContext`] handed to the evaluation registers an edge.
//! The context is an explicit value rather than ambient thread-local state,
//! so it survives `.await` points and task migration.

mod atom;
mod context;
mod family;
mod loadable;
mod selector;
mod subscriber;

pub use atom::Atom;
pub use context::GetContext;
pub use family::SelectorFamily;
pub use loadable::Loadable;
pub use selector::Selector;
pub use subscriber::{Subscriber, SubscriberId};
