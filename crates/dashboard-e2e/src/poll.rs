//! Condition polling with bounded time.
//!
//! Every element helper and CLI wait in this crate is built on one loop:
//! invoke a predicate, return as soon as it reports a value, otherwise sleep
//! one interval and try again until the budget is spent.
//!
//! Predicate errors are split by [`Classify`]:
//!
//! - **Recoverable** errors ("element not found yet") are retried until the
//!   deadline and show up as `last_error` in the [`TimeoutError`].
//! - **Fatal** errors ("invalid selector", "session disconnected") stop the
//!   poll on first occurrence and are returned unchanged as
//!   [`PollError::Fatal`].
//!
//! Total time spent is bounded by `timeout + interval` plus however long the
//! predicate itself takes.
//!
//! ```
//! use dashboard_e2e::{poll_until_with, FakeClock, WaitDescriptor};
//! use std::convert::Infallible;
//!
//! let clock = FakeClock::new();
//! let mut calls = 0;
//! let value = poll_until_with(
//!     &clock,
//!     || {
//!         calls += 1;
//!         Ok::<_, Infallible>((calls == 3).then_some("ready"))
//!     },
//!     &WaitDescriptor::from_millis(1_000, 50),
//! )
//! .unwrap();
//! assert_eq!(value, "ready");
//! assert_eq!(clock.sleep_count(), 2);
//! ```

mod error;
mod readiness;
mod state;

pub use error::{PollError, TimeoutError};
pub use readiness::{Classify, ErrorClass, Probe, Readiness};

use crate::clock::{Clock, SystemClock};
use serde::{Deserialize, Serialize};
use state::{PollState, Step};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default budget for a wait (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default delay between attempts (500ms)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How long to wait, how often to look, and what for
///
/// Built right before a poll and discarded after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitDescriptor {
    /// Maximum time budget, counted from the first invocation
    pub timeout: Duration,
    /// Delay between invocations
    pub interval: Duration,
    /// Human-readable label used in timeout messages
    pub description: Option<String>,
}

impl Default for WaitDescriptor {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

impl WaitDescriptor {
    /// Create a descriptor from durations
    #[must_use]
    pub const fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            description: None,
        }
    }

    /// Create a descriptor from milliseconds
    #[must_use]
    pub const fn from_millis(timeout_ms: u64, interval_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(interval_ms),
        )
    }

    /// Budget expressed as `attempts × polling`
    #[must_use]
    pub fn from_attempts(attempts: u32, polling: Duration) -> Self {
        Self::new(polling.saturating_mul(attempts), polling)
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the interval
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Description, or a generic label
    #[must_use]
    pub fn label(&self) -> &str {
        self.description.as_deref().unwrap_or("condition")
    }

    /// Reject zero budgets and zero intervals
    pub fn validate<E>(&self) -> Result<(), PollError<E>> {
        if self.timeout.is_zero() {
            return Err(PollError::InvalidWait {
                reason: format!("timeout for {} must be greater than zero", self.label()),
            });
        }
        if self.interval.is_zero() {
            return Err(PollError::InvalidWait {
                reason: format!("interval for {} must be greater than zero", self.label()),
            });
        }
        Ok(())
    }
}

/// A descriptor plus an optional cancellation token
#[derive(Debug, Clone, Default)]
pub struct Poller {
    descriptor: WaitDescriptor,
    cancel: Option<CancellationToken>,
}

impl Poller {
    /// Create a poller for this descriptor
    #[must_use]
    pub const fn new(descriptor: WaitDescriptor) -> Self {
        Self {
            descriptor,
            cancel: None,
        }
    }

    /// Abort the poll early when `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The descriptor this poller runs with
    #[must_use]
    pub const fn descriptor(&self) -> &WaitDescriptor {
        &self.descriptor
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Poll on `clock`, classifying errors with [`Classify`]
    pub fn run<O, E, F>(&self, clock: &dyn Clock, predicate: F) -> Result<O::Value, PollError<E>>
    where
        F: FnMut() -> Result<O, E>,
        O: Readiness,
        E: Classify + Display,
    {
        self.run_classified(clock, predicate, |e: &E| e.classify())
    }

    /// Poll on `clock` with an explicit classification policy
    pub fn run_classified<O, E, F, C>(
        &self,
        clock: &dyn Clock,
        mut predicate: F,
        classify: C,
    ) -> Result<O::Value, PollError<E>>
    where
        F: FnMut() -> Result<O, E>,
        O: Readiness,
        E: Display,
        C: Fn(&E) -> ErrorClass,
    {
        self.descriptor.validate()?;
        let span = tracing::debug_span!("poll", description = self.descriptor.label());
        let _enter = span.enter();

        let start = clock.now();
        let mut state = PollState::new(&self.descriptor);
        loop {
            if self.is_cancelled() {
                return Err(state.cancelled());
            }
            let elapsed = clock.now().saturating_sub(start);
            match state.observe(predicate(), &classify, elapsed) {
                Step::Done(value) => {
                    tracing::debug!(attempts = state.attempts(), "wait finished");
                    return Ok(value);
                }
                Step::Fail(err) => return Err(err),
                Step::Retry => {}
            }

            clock.sleep(self.descriptor.interval);

            if self.is_cancelled() {
                return Err(state.cancelled());
            }
            if let Some(err) = state.check_deadline(clock.now().saturating_sub(start)) {
                return Err(err);
            }
        }
    }

    /// Poll an async predicate on the tokio timer
    pub async fn run_async<O, E, F, Fut>(&self, predicate: F) -> Result<O::Value, PollError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<O, E>>,
        O: Readiness,
        E: Classify + Display,
    {
        self.run_async_classified(predicate, |e: &E| e.classify())
            .await
    }

    /// Poll an async predicate with an explicit classification policy
    ///
    /// Cancellation interrupts the sleep between attempts.
    pub async fn run_async_classified<O, E, F, Fut, C>(
        &self,
        mut predicate: F,
        classify: C,
    ) -> Result<O::Value, PollError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<O, E>>,
        O: Readiness,
        E: Display,
        C: Fn(&E) -> ErrorClass,
    {
        self.descriptor.validate()?;
        tracing::debug!(description = self.descriptor.label(), "poll started");

        let start = tokio::time::Instant::now();
        let mut state = PollState::new(&self.descriptor);
        loop {
            if self.is_cancelled() {
                return Err(state.cancelled());
            }
            let outcome = predicate().await;
            match state.observe(outcome, &classify, start.elapsed()) {
                Step::Done(value) => {
                    tracing::debug!(
                        description = self.descriptor.label(),
                        attempts = state.attempts(),
                        "wait finished"
                    );
                    return Ok(value);
                }
                Step::Fail(err) => return Err(err),
                Step::Retry => {}
            }

            match self.cancel {
                Some(ref token) => {
                    tokio::select! {
                        () = token.cancelled() => return Err(state.cancelled()),
                        () = tokio::time::sleep(self.descriptor.interval) => {}
                    }
                }
                None => tokio::time::sleep(self.descriptor.interval).await,
            }

            if let Some(err) = state.check_deadline(start.elapsed()) {
                return Err(err);
            }
        }
    }
}

/// Poll `predicate` on the system clock until it is ready or `descriptor` runs out
pub fn poll_until<O, E, F>(predicate: F, descriptor: &WaitDescriptor) -> Result<O::Value, PollError<E>>
where
    F: FnMut() -> Result<O, E>,
    O: Readiness,
    E: Classify + Display,
{
    poll_until_with(&SystemClock::new(), predicate, descriptor)
}

/// [`poll_until`] on an explicit clock
pub fn poll_until_with<O, E, F>(
    clock: &dyn Clock,
    predicate: F,
    descriptor: &WaitDescriptor,
) -> Result<O::Value, PollError<E>>
where
    F: FnMut() -> Result<O, E>,
    O: Readiness,
    E: Classify + Display,
{
    Poller::new(descriptor.clone()).run(clock, predicate)
}

/// Async [`poll_until`]; sleeps on the tokio timer
pub async fn poll_until_async<O, E, F, Fut>(
    predicate: F,
    descriptor: &WaitDescriptor,
) -> Result<O::Value, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<O, E>>,
    O: Readiness,
    E: Classify + Display,
{
    Poller::new(descriptor.clone()).run_async(predicate).await
}

/// Wait until `check` reports `false`, on the system clock
///
/// Recoverable errors from `check` count as "still present".
pub fn wait_absence<E, F>(check: F, descriptor: &WaitDescriptor) -> Result<(), PollError<E>>
where
    F: FnMut() -> Result<bool, E>,
    E: Classify + Display,
{
    wait_absence_with(&SystemClock::new(), check, descriptor)
}

/// [`wait_absence`] on an explicit clock
pub fn wait_absence_with<E, F>(
    clock: &dyn Clock,
    mut check: F,
    descriptor: &WaitDescriptor,
) -> Result<(), PollError<E>>
where
    F: FnMut() -> Result<bool, E>,
    E: Classify + Display,
{
    poll_until_with(clock, || check().map(|present| !present), descriptor).map(|_| ())
}

/// Async [`wait_absence`]
pub async fn wait_absence_async<E, F, Fut>(
    mut check: F,
    descriptor: &WaitDescriptor,
) -> Result<(), PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: Classify + Display,
{
    let negated = || {
        let fut = check();
        async move { fut.await.map(|present| !present) }
    };
    poll_until_async(negated, descriptor).await.map(|_| ())
}
