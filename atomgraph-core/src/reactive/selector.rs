//! Selector Implementation
//!
//! A Selector is a cached derived value. Its evaluation function reads other
//! nodes through a [`GetContext`] and produces a value or a rejection,
//! synchronously or asynchronously.
//!
//! # How Selectors Work
//!
//! 1. On first read, the store starts the evaluation and caches its outcome
//!    once it settles.
//!
//! 2. When read again, if nothing it read has changed, the cached outcome
//!    (value *or* rejection) is returned without running the function.
//!
//! 3. When an atom it (transitively) read is written, the entry is marked
//!    stale.
//!
//! 4. The next read re-evaluates it, rediscovering its dependencies.
//!
//! A selector handle is only a declaration: the key and the function. All
//! state lives in the [`Store`](crate::Store), so one declaration can be read
//! from any number of stores.

use std::fmt::Debug;
use std::future::{ready, Future};
use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::FutureExt;

use super::GetContext;
use crate::error::NodeError;
use crate::graph::node::{EvalFn, Value};
use crate::graph::{GraphNode, NodeKey, NodeKind};

/// A derived node producing values of type `T`.
///
/// # Example
///
/// ```rust
/// use atomgraph_core::{Atom, Loadable, Selector, Store};
///
/// let count = Atom::new("count", 2);
/// let doubled = {
///     let count = count.clone();
///     Selector::derived("doubled", move |ctx| Ok(ctx.get_atom(&count)? * 2))
/// };
///
/// let store = Store::new();
/// assert_eq!(store.read(&doubled), Loadable::Resolved(4));
/// ```
pub struct Selector<T> {
    key: NodeKey,
    eval: EvalFn,
    _value: PhantomData<fn() -> T>,
}

impl<T> Selector<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Declare an asynchronous selector.
    ///
    /// `get` is called once per evaluation. The future it returns may await
    /// other selectors through the context and any other I/O.
    pub fn new<F, Fut>(key: impl Into<Arc<str>>, get: F) -> Self
    where
        F: Fn(GetContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, NodeError>> + Send + 'static,
    {
        Self::from_key(NodeKey::named(key), get)
    }

    /// Declare a synchronous selector. It can read atoms and peek at other
    /// selectors, and resolves on the read that evaluates it.
    pub fn derived<F>(key: impl Into<Arc<str>>, get: F) -> Self
    where
        F: Fn(&GetContext) -> Result<T, NodeError> + Send + Sync + 'static,
    {
        Self::new(key, move |ctx| ready(get(&ctx)))
    }

    pub(crate) fn from_key<F, Fut>(key: NodeKey, get: F) -> Self
    where
        F: Fn(GetContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, NodeError>> + Send + 'static,
    {
        let eval: EvalFn = Arc::new(move |ctx: GetContext| {
            let evaluation = get(ctx);
            async move { evaluation.await.map(|value| Arc::new(value) as Value) }.boxed()
        });

        Self {
            key,
            eval,
            _value: PhantomData,
        }
    }

    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    pub(crate) fn eval(&self) -> &EvalFn {
        &self.eval
    }
}

impl<T> GraphNode for Selector<T> {
    fn key(&self) -> &NodeKey {
        &self.key
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Selector
    }
}

impl<T> Clone for Selector<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            eval: Arc::clone(&self.eval),
            _value: PhantomData,
        }
    }
}

impl<T> Debug for Selector<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("key", &self.key)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EntryState;
    use crate::reactive::{Atom, Loadable};
    use crate::Store;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn selector_computes_on_first_read() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let selector = Selector::derived("answer", move |_ctx| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Ok(42)
        });
        let store = Store::new();

        // Declaring does not evaluate.
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.state(&selector), EntryState::Uninitialized);

        assert_eq!(store.read(&selector), Loadable::Resolved(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rejection_is_cached_like_a_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let selector: Selector<i32> = Selector::derived("broken", move |_ctx| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Err(NodeError::domain("broken"))
        });
        let store = Store::new();

        assert_eq!(store.read(&selector), Loadable::Rejected(NodeError::domain("broken")));
        assert_eq!(store.read(&selector), Loadable::Rejected(NodeError::domain("broken")));
        assert_eq!(store.state(&selector), EntryState::Rejected);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rejection_propagates_to_dependents_until_fixed() {
        let store = Store::new();
        let divisor = Atom::new("divisor", 0);

        let d = divisor.clone();
        let inverse = Selector::derived("inverse", move |ctx| match ctx.get_atom(&d)? {
            0 => Err(NodeError::domain("division by zero")),
            n => Ok(100 / n),
        });
        let inverse_clone = inverse.clone();
        let label = Selector::new("label", move |ctx| {
            let inverse = inverse_clone.clone();
            async move { Ok(format!("= {}", ctx.get(&inverse).await?)) }
        });

        let expected = NodeError::domain("division by zero");
        assert_eq!(store.read(&label), Loadable::Rejected(expected));

        // The only way out is a write that invalidates the chain.
        store.write_atom(&divisor, 4);
        assert_eq!(store.state(&label), EntryState::Stale);
        assert_eq!(store.read(&label), Loadable::Resolved("= 25".to_string()));
    }

    #[test]
    fn dependents_may_substitute_a_fallback() {
        let store = Store::new();
        let failing: Selector<i32> = Selector::derived("failing", |_ctx| Err(NodeError::domain("no")));
        let failing_clone = failing.clone();
        let guarded = Selector::new("guarded", move |ctx| {
            let failing = failing_clone.clone();
            async move { Ok(ctx.get(&failing).await.unwrap_or(-1)) }
        });

        assert_eq!(store.read(&guarded), Loadable::Resolved(-1));
        assert_eq!(store.state(&failing), EntryState::Rejected);
    }

    #[test]
    fn one_declaration_many_stores() {
        let atom = Atom::new("n", 1);
        let atom_clone = atom.clone();
        let plus_one = Selector::derived("plus_one", move |ctx| Ok(ctx.get_atom(&atom_clone)? + 1));

        let first = Store::new();
        let second = Store::new();
        first.write_atom(&atom, 10);

        assert_eq!(first.read(&plus_one), Loadable::Resolved(11));
        assert_eq!(second.read(&plus_one), Loadable::Resolved(2));
    }
}
