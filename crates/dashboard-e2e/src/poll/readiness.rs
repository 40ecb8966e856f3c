//! What a predicate returns, and how its errors are classified.

use std::convert::Infallible;

/// Whether a predicate error should be retried or propagated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The condition is not true yet; retry until the deadline
    Recoverable,
    /// Retrying cannot help; propagate immediately
    Fatal,
}

/// Error classification used by the poller
pub trait Classify {
    /// Classify this error
    fn classify(&self) -> ErrorClass;

    /// Shorthand for `classify() == Recoverable`
    fn is_recoverable(&self) -> bool {
        self.classify() == ErrorClass::Recoverable
    }
}

impl Classify for Infallible {
    fn classify(&self) -> ErrorClass {
        match *self {}
    }
}

/// A predicate's success value, normalised to "ready with a value" or "not ready"
pub trait Readiness {
    /// The value handed back to the caller once ready
    type Value;

    /// `Some` when the condition holds
    fn into_ready(self) -> Option<Self::Value>;
}

impl Readiness for bool {
    type Value = bool;

    fn into_ready(self) -> Option<bool> {
        self.then_some(true)
    }
}

impl<T> Readiness for Option<T> {
    type Value = T;

    fn into_ready(self) -> Option<T> {
        self
    }
}

/// Explicit readiness for predicates whose value type is itself `bool` or `Option`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// Condition holds
    Ready(T),
    /// Try again later
    NotReady,
}

impl<T> Readiness for Probe<T> {
    type Value = T;

    fn into_ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::NotReady => None,
        }
    }
}

impl<T> From<Option<T>> for Probe<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::NotReady, Self::Ready)
    }
}
