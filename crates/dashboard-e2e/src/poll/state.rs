//! Timing rules shared by the sync and async pollers.
//!
//! The drivers only differ in how they sleep; every decision about
//! succeeding, retrying, or failing is made here.

use super::error::{PollError, TimeoutError};
use super::readiness::{ErrorClass, Readiness};
use super::WaitDescriptor;
use std::fmt::Display;
use std::time::Duration;

/// What the driver should do after an attempt
#[derive(Debug)]
pub(crate) enum Step<T, E> {
    /// Condition held
    Done(T),
    /// Stop with this error
    Fail(PollError<E>),
    /// Sleep one interval, then check the deadline
    Retry,
}

/// Bookkeeping for one poll
#[derive(Debug)]
pub(crate) struct PollState<'a> {
    descriptor: &'a WaitDescriptor,
    attempts: usize,
    last_error: Option<String>,
}

impl<'a> PollState<'a> {
    pub(crate) const fn new(descriptor: &'a WaitDescriptor) -> Self {
        Self {
            descriptor,
            attempts: 0,
            last_error: None,
        }
    }

    pub(crate) const fn attempts(&self) -> usize {
        self.attempts
    }

    /// Record one predicate invocation
    pub(crate) fn observe<O, E>(
        &mut self,
        outcome: Result<O, E>,
        classify: impl Fn(&E) -> ErrorClass,
        elapsed: Duration,
    ) -> Step<O::Value, E>
    where
        O: Readiness,
        E: Display,
    {
        self.attempts += 1;
        match outcome {
            Ok(value) => match value.into_ready() {
                Some(ready) => {
                    tracing::trace!(
                        attempts = self.attempts,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "condition satisfied"
                    );
                    Step::Done(ready)
                }
                None => {
                    tracing::debug!(
                        attempt = self.attempts,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "condition not met yet"
                    );
                    self.last_error = None;
                    Step::Retry
                }
            },
            Err(err) => match classify(&err) {
                ErrorClass::Recoverable => {
                    tracing::debug!(
                        attempt = self.attempts,
                        elapsed_ms = elapsed.as_millis() as u64,
                        error = %err,
                        "recoverable error, retrying"
                    );
                    self.last_error = Some(err.to_string());
                    Step::Retry
                }
                ErrorClass::Fatal => {
                    tracing::debug!(attempt = self.attempts, error = %err, "fatal error, giving up");
                    Step::Fail(PollError::Fatal(err))
                }
            },
        }
    }

    /// Called after each sleep; `Some` once the budget is spent
    pub(crate) fn check_deadline<E>(&self, elapsed: Duration) -> Option<PollError<E>> {
        if elapsed < self.descriptor.timeout {
            return None;
        }
        let err = self.timeout_error(elapsed);
        tracing::warn!("{err}");
        Some(PollError::Timeout(err))
    }

    pub(crate) fn cancelled<E>(&self) -> PollError<E> {
        PollError::Cancelled {
            description: self.descriptor.label().to_string(),
        }
    }

    fn timeout_error(&self, elapsed: Duration) -> TimeoutError {
        TimeoutError {
            timeout: self.descriptor.timeout,
            elapsed,
            attempts: self.attempts,
            description: self.descriptor.description.clone(),
            last_error: self.last_error.clone(),
        }
    }
}
