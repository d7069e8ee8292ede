//! Loadable values.
//!
//! A [`Loadable`] is what a non-suspending read reports: the value, the
//! rejection, or the fact that the evaluation is still running.

use crate::error::NodeError;

/// The observable state of a read.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    Pending,
    Resolved(T),
    Rejected(NodeError),
}

impl<T> Loadable<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Loadable::Pending)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Loadable::Resolved(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Loadable::Rejected(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Loadable::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Loadable::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&NodeError> {
        match self {
            Loadable::Rejected(err) => Some(err),
            _ => None,
        }
    }

    /// Transform the resolved value, keeping the other states.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Loadable<U> {
        match self {
            Loadable::Pending => Loadable::Pending,
            Loadable::Resolved(value) => Loadable::Resolved(f(value)),
            Loadable::Rejected(err) => Loadable::Rejected(err),
        }
    }

    /// Combine many loadables.
    ///
    /// The first rejection wins over everything, then any pending read makes
    /// the whole pending. Only when all resolved are the values returned,
    /// in order.
    pub fn all<I>(loadables: I) -> Loadable<Vec<T>>
    where
        I: IntoIterator<Item = Loadable<T>>,
    {
        let mut values = Vec::new();
        let mut pending = false;
        for loadable in loadables {
            match loadable {
                Loadable::Rejected(err) => return Loadable::Rejected(err),
                Loadable::Pending => pending = true,
                Loadable::Resolved(value) => values.push(value),
            }
        }

        if pending {
            Loadable::Pending
        } else {
            Loadable::Resolved(values)
        }
    }
}

impl<T> From<Result<T, NodeError>> for Loadable<T> {
    fn from(result: Result<T, NodeError>) -> Self {
        match result {
            Ok(value) => Loadable::Resolved(value),
            Err(err) => Loadable::Rejected(err),
        }
    }
}
