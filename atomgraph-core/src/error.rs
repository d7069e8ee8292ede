//! Error Types
//!
//! Two kinds of failure exist in the graph and they are kept apart:
//!
//! - [`NodeError`] is a *value*. It is what a rejected selector holds, it is
//!   cloned to every dependent that reads the selector, and it disappears when
//!   a write invalidates the failed chain.
//! - [`GraphError`] describes a programming mistake (a key reused with a
//!   different type, a selector that reads itself). The store panics with its
//!   message; there is nothing to recover.

use thiserror::Error;

/// The rejection carried by a selector whose evaluation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// A business-rule failure, usually reported by the data source.
    #[error("{0}")]
    Domain(String),

    /// The store was dropped while an evaluation still needed it.
    #[error("the store was dropped before the evaluation finished")]
    StoreDropped,
}

impl NodeError {
    /// Build a domain rejection from any message.
    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain(message.into())
    }
}

/// Misuse of the graph. Fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node `{key}` is declared as {declared} but was used as {requested}")]
    TypeMismatch {
        key: String,
        declared: String,
        requested: String,
    },

    #[error("dependency cycle: `{reader}` reads `{dependency}`, which already depends on it")]
    Cycle { reader: String, dependency: String },

    #[error("parameter of family `{family}` cannot be used as a cache key: {reason}")]
    InvalidParam { family: String, reason: String },
}

/// Errors raised by the demo application's input handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("`{0}` is not a valid user id")]
    InvalidUserId(String),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_displays_message_verbatim() {
        let err = NodeError::domain("There was an error");
        assert_eq!(err.to_string(), "There was an error");
    }

    #[test]
    fn cycle_error_names_both_nodes() {
        let err = GraphError::Cycle {
            reader: "a".into(),
            dependency: "b".into(),
        };
        let message = err.to_string();
        assert!(message.contains("`a`"));
        assert!(message.contains("`b`"));
    }
}
