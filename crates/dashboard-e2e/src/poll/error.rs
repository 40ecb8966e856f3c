//! Poll failures.

use std::fmt;
use std::time::Duration;

/// A wait ran out of budget before its condition held
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutError {
    /// Configured budget
    pub timeout: Duration,
    /// Time actually spent
    pub elapsed: Duration,
    /// Number of predicate invocations
    pub attempts: usize,
    /// What was being waited for
    pub description: Option<String>,
    /// Last recoverable error the predicate reported, if any
    pub last_error: Option<String>,
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timed out after {}ms", self.timeout.as_millis())?;
        if let Some(ref desc) = self.description {
            write!(f, " waiting for {desc}")?;
        }
        write!(
            f,
            " ({} attempt(s), {}ms elapsed",
            self.attempts,
            self.elapsed.as_millis()
        )?;
        if let Some(ref last) = self.last_error {
            write!(f, ", last error: {last}")?;
        }
        write!(f, ")")
    }
}

impl std::error::Error for TimeoutError {}

/// Why a poll did not produce a value
#[derive(Debug)]
pub enum PollError<E> {
    /// Deadline exceeded
    Timeout(TimeoutError),
    /// Non-recoverable predicate error, passed through unchanged
    Fatal(E),
    /// The cancellation token fired
    Cancelled {
        /// What was being waited for
        description: String,
    },
    /// Zero timeout or interval
    InvalidWait {
        /// Why the descriptor was rejected
        reason: String,
    },
}

impl<E> PollError<E> {
    /// Check whether this is a timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// The fatal error, if this is one
    pub fn into_fatal(self) -> Option<E> {
        match self {
            Self::Fatal(e) => Some(e),
            _ => None,
        }
    }

    /// Map the fatal error type
    pub fn map_fatal<F>(self, f: impl FnOnce(E) -> F) -> PollError<F> {
        match self {
            Self::Timeout(t) => PollError::Timeout(t),
            Self::Fatal(e) => PollError::Fatal(f(e)),
            Self::Cancelled { description } => PollError::Cancelled { description },
            Self::InvalidWait { reason } => PollError::InvalidWait { reason },
        }
    }
}

impl<E: fmt::Display> fmt::Display for PollError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(t) => t.fmt(f),
            Self::Fatal(e) => e.fmt(f),
            Self::Cancelled { description } => write!(f, "wait for {description} was cancelled"),
            Self::InvalidWait { reason } => write!(f, "invalid wait: {reason}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for PollError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fatal(e) => Some(e),
            Self::Timeout(t) => Some(t),
            _ => None,
        }
    }
}

impl<E> From<TimeoutError> for PollError<E> {
    fn from(t: TimeoutError) -> Self {
        Self::Timeout(t)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn timeout(description: Option<&str>, last_error: Option<&str>) -> TimeoutError {
        TimeoutError {
            timeout: Duration::from_millis(300),
            elapsed: Duration::from_millis(320),
            attempts: 4,
            description: description.map(String::from),
            last_error: last_error.map(String::from),
        }
    }

    #[test]
    fn test_display_includes_timeout() {
        let display = timeout(None, None).to_string();
        assert_eq!(display, "timed out after 300ms (4 attempt(s), 320ms elapsed)");
    }

    #[test]
    fn test_display_includes_description_and_last_error() {
        let display = timeout(Some("dashboard loader"), Some("no such element")).to_string();
        assert!(display.contains("300ms"));
        assert!(display.contains("waiting for dashboard loader"));
        assert!(display.contains("last error: no such element"));
    }

    #[test]
    fn test_poll_error_display() {
        let err: PollError<std::io::Error> = PollError::Cancelled {
            description: "workspace".into(),
        };
        assert_eq!(err.to_string(), "wait for workspace was cancelled");

        let err: PollError<std::io::Error> = PollError::InvalidWait {
            reason: "interval must be non-zero".into(),
        };
        assert!(err.to_string().contains("interval"));
    }

    #[test]
    fn test_into_fatal() {
        let err: PollError<&str> = PollError::Fatal("boom");
        assert_eq!(err.into_fatal(), Some("boom"));

        let err: PollError<&str> = timeout(None, None).into();
        assert!(err.is_timeout());
        assert_eq!(err.into_fatal(), None);
    }

    #[test]
    fn test_map_fatal() {
        let err: PollError<u8> = PollError::Fatal(7);
        let mapped = err.map_fatal(|n| format!("code {n}"));
        assert_eq!(mapped.into_fatal().as_deref(), Some("code 7"));
    }
}
