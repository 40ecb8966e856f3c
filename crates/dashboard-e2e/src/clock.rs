//! Clock and sleep providers for the synchronous poller.
//!
//! [`SystemClock`] is what production waits use. [`FakeClock`] makes
//! time-dependent waits deterministic: sleeping advances virtual time
//! instantly, so a 30 second timeout test finishes in microseconds.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of monotonic time and sleeping
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Monotonic time since the clock was created
    fn now(&self) -> Duration;

    /// Block the caller for `duration`
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Wall clock backed by [`Instant`] and [`std::thread::sleep`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual clock for deterministic tests
///
/// All state lives in atomics so a predicate closure can hold a shared
/// reference and advance time while the poller is sleeping on the same clock.
#[derive(Debug, Default)]
pub struct FakeClock {
    now_nanos: AtomicU64,
    sleeps: AtomicUsize,
    slept_nanos: AtomicU64,
}

impl FakeClock {
    /// Create a fake clock at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fake clock wrapped in an [`Arc`] for sharing
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Move time forward without counting it as a sleep
    pub fn advance(&self, duration: Duration) {
        let _ = self
            .now_nanos
            .fetch_add(duration_nanos(duration), Ordering::SeqCst);
    }

    /// Number of times [`Clock::sleep`] was called
    #[must_use]
    pub fn sleep_count(&self) -> usize {
        self.sleeps.load(Ordering::SeqCst)
    }

    /// Total time spent in [`Clock::sleep`]
    #[must_use]
    pub fn total_slept(&self) -> Duration {
        Duration::from_nanos(self.slept_nanos.load(Ordering::SeqCst))
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.now_nanos.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) {
        let nanos = duration_nanos(duration);
        let _ = self.sleeps.fetch_add(1, Ordering::SeqCst);
        let _ = self.slept_nanos.fetch_add(nanos, Ordering::SeqCst);
        let _ = self.now_nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
