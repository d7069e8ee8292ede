//! Selector Families
//!
//! A family is a selector template parameterized by a key. Each distinct
//! parameter yields its own selector instance with its own cache entry.
//!
//! Parameters are compared by value. The canonical form of a parameter is
//! its JSON encoding, so `user_info.at(1)` built twice addresses the same
//! entry, while `user_info.at(1)` and `user_info.at(2)` never share one.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Serialize;

use super::{GetContext, Selector};
use crate::error::{GraphError, NodeError};
use crate::graph::NodeKey;

type FamilyFn<P, T> = Arc<dyn Fn(P, GetContext) -> BoxFuture<'static, Result<T, NodeError>> + Send + Sync>;

/// A parameterized selector declaration.
pub struct SelectorFamily<P, T> {
    name: Arc<str>,
    get: FamilyFn<P, T>,
    _param: PhantomData<fn(P)>,
}

impl<P, T> SelectorFamily<P, T>
where
    P: Serialize + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Declare a family. `get` receives the instance's parameter and the
    /// evaluation context.
    pub fn new<F, Fut>(name: impl Into<Arc<str>>, get: F) -> Self
    where
        F: Fn(P, GetContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, NodeError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            get: Arc::new(move |param, ctx| get(param, ctx).boxed()),
            _param: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The instance for `param`.
    ///
    /// # Panics
    ///
    /// If `param` cannot be serialized (for example a map with non-string
    /// keys).
    pub fn at(&self, param: P) -> Selector<T> {
        let key = NodeKey::with_param(Arc::clone(&self.name), self.param_key(&param));
        let get = Arc::clone(&self.get);
        Selector::from_key(key, move |ctx| get(param.clone(), ctx))
    }

    fn param_key(&self, param: &P) -> String {
        match serde_json::to_string(param) {
            Ok(key) => key,
            Err(err) => panic!(
                "{}",
                GraphError::InvalidParam {
                    family: self.name.to_string(),
                    reason: err.to_string(),
                }
            ),
        }
    }
}

impl<P, T> Clone for SelectorFamily<P, T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            get: Arc::clone(&self.get),
            _param: PhantomData,
        }
    }
}

impl<P, T> std::fmt::Debug for SelectorFamily<P, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectorFamily")
            .field("name", &self.name)
            .finish()
    }
}
