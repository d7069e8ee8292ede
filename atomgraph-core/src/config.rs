//! Configuration
//!
//! Settings for the demo application. Every field has a default, so an
//! empty JSON object is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::graph::AggregateMode;
use crate::source::UserId;
use crate::view::Fallbacks;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Latency of every simulated lookup.
    pub fetch_delay_ms: u64,

    /// Friends listed in every simulated record.
    pub friends: Vec<UserId>,

    /// How `friends_info` combines the friend lookups.
    pub aggregate_mode: AggregateMode,

    /// Text shown by the boundaries.
    pub fallbacks: Fallbacks,

    /// Users shown at the top of the page.
    pub pinned_users: Vec<UserId>,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch_delay_ms: 2_000,
            friends: vec![1, 2, 3, 4],
            aggregate_mode: AggregateMode::FailFast,
            fallbacks: Fallbacks::default(),
            pinned_users: vec![1, 2, 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_the_default() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.fetch_delay(), Duration::from_secs(2));
    }

    #[test]
    fn fields_override_defaults() {
        let config = Config::from_json(
            r#"{"fetch_delay_ms": 50, "aggregate_mode": "best_effort", "fallbacks": {"loading": "..."}}"#,
        )
        .unwrap();

        assert_eq!(config.fetch_delay(), Duration::from_millis(50));
        assert_eq!(config.aggregate_mode, AggregateMode::BestEffort);
        assert_eq!(config.fallbacks.loading, "...");
        assert_eq!(config.fallbacks.error, "Error!");
        assert_eq!(config.friends, vec![1, 2, 3, 4]);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = Config::from_json(r#"{"fetch_delay_ms": "soon"}"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid configuration"));
    }
}
