//! Atomgraph Core
//!
//! This crate provides a reactive value graph for asynchronous data
//! dependencies. It implements:
//!
//! - Reactive nodes (atoms, selectors, selector families)
//! - Lazy invalidation and cached, single-flight evaluation
//! - Fail-fast and best-effort aggregation of concurrent reads
//! - A demo user directory over a simulated data source, with a headless
//!   view that renders loading and error fallbacks
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Node declarations and the evaluation context
//! - `graph`: The store, its cache entries and the dependency edges
//! - `source`: The asynchronous data source contract and its simulation
//! - `app`: The demo graph and its input handlers
//! - `view`: Failure-isolation boundaries and page rendering
//! - `config`: Application settings
//!
//! # Example
//!
//! ```rust
//! use atomgraph_core::{Atom, Loadable, Selector, Store};
//!
//! // Create an atom
//! let count = Atom::new("count", 1);
//!
//! // Create a derived value
//! let doubled = {
//!     let count = count.clone();
//!     Selector::derived("doubled", move |ctx| Ok(ctx.get_atom(&count)? * 2))
//! };
//!
//! let store = Store::new();
//! assert_eq!(store.read(&doubled), Loadable::Resolved(2));
//!
//! // Writing marks `doubled` stale; the next read recomputes it
//! store.write_atom(&count, 5);
//! assert_eq!(store.read(&doubled), Loadable::Resolved(10));
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod graph;
pub mod reactive;
pub mod source;
pub mod view;

pub use config::Config;
pub use error::{AppError, ConfigError, GraphError, NodeError};
pub use graph::{AggregateMode, EntryState, GraphNode, NodeKey, NodeKind, Store};
pub use reactive::{Atom, GetContext, Loadable, Selector, SelectorFamily, SubscriberId};
