//! Data Source
//!
//! The asynchronous backend the demo graph queries. [`SimulatedDb`] stands
//! in for a real database: every lookup resolves after a fixed delay, and
//! negative ids come back with an error field set.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::NodeError;

pub type UserId = i64;

/// Message carried by every failed lookup.
pub const LOOKUP_ERROR: &str = "There was an error while attempting to retrieve user info.";

/// A user record as returned by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub friends: Vec<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Record {
    /// The record itself, or its error as a rejection.
    pub fn into_result(self) -> Result<Record, NodeError> {
        match self.error {
            Some(message) => Err(NodeError::Domain(message)),
            None => Ok(self),
        }
    }
}

/// An asynchronous user lookup.
pub trait DataSource: Send + Sync {
    /// Look up one user. Lookups never fail at the transport level; a
    /// failed lookup is a record with `error` set.
    fn lookup(&self, id: UserId) -> BoxFuture<'static, Record>;
}

/// In-memory source answering every lookup after a delay.
#[derive(Debug)]
pub struct SimulatedDb {
    delay: Duration,
    friends: Vec<UserId>,
    lookups: AtomicUsize,
}

impl SimulatedDb {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            friends: vec![1, 2, 3, 4],
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.fetch_delay()).with_friends(config.friends.clone())
    }

    /// Friends listed in every record.
    pub fn with_friends(mut self, friends: Vec<UserId>) -> Self {
        self.friends = friends;
        self
    }

    /// Number of lookups started so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn record(&self, id: UserId) -> Record {
        Record {
            id,
            name: format!("Name of {id}"),
            friends: self.friends.clone(),
            error: (id < 0).then(|| LOOKUP_ERROR.to_string()),
        }
    }
}

impl DataSource for SimulatedDb {
    fn lookup(&self, id: UserId) -> BoxFuture<'static, Record> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(id, "lookup started");

        let record = self.record(id);
        let delay = self.delay;
        async move {
            tokio::time::sleep(delay).await;
            record
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn lookup_resolves_after_the_delay() {
        let db = SimulatedDb::new(Duration::from_secs(2));
        let started = tokio::time::Instant::now();

        let record = db.lookup(7).await;

        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(record.name, "Name of 7");
        assert_eq!(record.friends, vec![1, 2, 3, 4]);
        assert_eq!(record.error, None);
        assert_eq!(db.lookups(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn negative_ids_carry_an_error() {
        let db = SimulatedDb::new(Duration::from_millis(10)).with_friends(vec![]);
        let record = db.lookup(-1).await;

        assert_eq!(record.error.as_deref(), Some(LOOKUP_ERROR));
        assert_eq!(record.into_result(), Err(NodeError::domain(LOOKUP_ERROR)));
    }

    #[test]
    fn record_json_omits_missing_error() {
        let record = Record {
            id: 1,
            name: "Name of 1".into(),
            friends: vec![2],
            error: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"id":1,"name":"Name of 1","friends":[2]}"#);

        let parsed: Record = serde_json::from_str(r#"{"id":3,"name":"x"}"#).unwrap();
        assert!(parsed.friends.is_empty());
    }
}
