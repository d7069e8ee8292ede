//! Aggregation
//!
//! Fan-out reads over a list of selectors. Every read is issued before any
//! of them is waited on, so independent evaluations run concurrently and the
//! caller suspends once, on the combined completion.
//!
//! Two modes exist:
//!
//! - **fail-fast** (`wait_for_all`): resolves with every value once all have
//!   resolved, and rejects with the first rejection as soon as it is known,
//!   whatever state the other reads are in.
//! - **best-effort** (`wait_for_none`): never waits. It returns the current
//!   [`Loadable`] of each read. A selector that aggregates this way is
//!   invalidated whenever one of the stragglers settles, so it converges on
//!   the full set.

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};

use super::node::downcast;
use super::store::Store;
use crate::error::NodeError;
use crate::reactive::{GetContext, Loadable, Selector};

/// How a list of reads is combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateMode {
    /// Wait for all; reject on the first rejection.
    #[default]
    FailFast,

    /// Take whatever has resolved so far.
    BestEffort,
}

impl Store {
    /// Snapshot of a fail-fast aggregate. Issues every read, then reports
    /// `Rejected` if any read rejected, `Pending` if any is still pending,
    /// and the values otherwise.
    pub fn wait_for_all<T>(&self, selectors: &[Selector<T>]) -> Loadable<Vec<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let reads: Vec<_> = selectors.iter().map(|selector| self.read(selector)).collect();
        Loadable::all(reads)
    }

    /// Current state of every read, without waiting for any of them.
    pub fn wait_for_none<T>(&self, selectors: &[Selector<T>]) -> Vec<Loadable<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        selectors.iter().map(|selector| self.read(selector)).collect()
    }
}

impl GetContext {
    /// Depend on every selector and wait until all of them resolve.
    ///
    /// Rejects with the first rejection as soon as it is known.
    pub async fn wait_for_all<T>(&self, selectors: &[Selector<T>]) -> Result<Vec<T>, NodeError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let loads: Vec<_> = {
            let store = self.store()?;
            selectors
                .iter()
                .map(|selector| {
                    store.track(selector, self);
                    (selector.key().clone(), store.load(selector))
                })
                .collect()
        };

        let weak = self.weak_store();
        let values = try_join_all(
            loads
                .into_iter()
                .map(|(key, load)| load.outcome(weak.clone(), key)),
        )
        .await?;

        Ok(selectors
            .iter()
            .zip(&values)
            .map(|(selector, value)| downcast(selector.key(), value))
            .collect())
    }

    /// Depend on every selector and report their current states.
    ///
    /// The evaluating node is invalidated each time one of the pending reads
    /// settles.
    pub fn wait_for_none<T>(&self, selectors: &[Selector<T>]) -> Result<Vec<Loadable<T>>, NodeError>
    where
        T: Clone + Send + Sync + 'static,
    {
        selectors.iter().map(|selector| self.peek(selector)).collect()
    }

    /// Combine reads according to `mode`. In best-effort mode only the
    /// values resolved so far are returned; rejections are skipped.
    pub async fn aggregate<T>(
        &self,
        selectors: &[Selector<T>],
        mode: AggregateMode,
    ) -> Result<Vec<T>, NodeError>
    where
        T: Clone + Send + Sync + 'static,
    {
        match mode {
            AggregateMode::FailFast => self.wait_for_all(selectors).await,
            AggregateMode::BestEffort => Ok(self
                .wait_for_none(selectors)?
                .into_iter()
                .filter_map(Loadable::into_value)
                .collect()),
        }
    }
}
