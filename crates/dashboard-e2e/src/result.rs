//! Result and error types for dashboard-e2e.

use crate::executor::CommandError;
use crate::poll::{Classify, ErrorClass, PollError, TimeoutError};
use crate::session::SessionError;
use std::convert::Infallible;
use thiserror::Error;

/// Result type for dashboard-e2e operations
pub type E2eResult<T> = Result<T, E2eError>;

/// Errors that can occur while driving the dashboard or the cluster CLI
#[derive(Debug, Error)]
pub enum E2eError {
    /// A wait ran out of budget
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    /// A wait was cancelled before it completed
    #[error("Wait for {description} was cancelled")]
    Cancelled {
        /// What was being waited for
        description: String,
    },

    /// A wait was configured with a zero timeout or interval
    #[error("Invalid wait: {reason}")]
    InvalidWait {
        /// Why the descriptor was rejected
        reason: String,
    },

    /// Browser session error
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Subprocess error
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl E2eError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check whether this error is a timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl Classify for E2eError {
    fn classify(&self) -> ErrorClass {
        match self {
            // A nested wait timing out only means the outer condition is not true yet
            Self::Timeout(_) => ErrorClass::Recoverable,
            Self::Session(e) => e.classify(),
            Self::Command(e) => e.classify(),
            Self::Cancelled { .. }
            | Self::InvalidWait { .. }
            | Self::Config { .. }
            | Self::Io(_)
            | Self::Json(_) => ErrorClass::Fatal,
        }
    }
}

impl From<Infallible> for E2eError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl<E: Into<Self>> From<PollError<E>> for E2eError {
    fn from(err: PollError<E>) -> Self {
        match err {
            PollError::Timeout(timeout) => Self::Timeout(timeout),
            PollError::Fatal(e) => e.into(),
            PollError::Cancelled { description } => Self::Cancelled { description },
            PollError::InvalidWait { reason } => Self::InvalidWait { reason },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn timeout() -> TimeoutError {
        TimeoutError {
            timeout: Duration::from_millis(300),
            elapsed: Duration::from_millis(300),
            attempts: 3,
            description: Some("loader".into()),
            last_error: None,
        }
    }

    #[test]
    fn test_config_error() {
        let err = E2eError::config("bad url");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad url"));
        assert_eq!(err.classify(), ErrorClass::Fatal);
    }

    #[test]
    fn test_timeout_is_transparent() {
        let err = E2eError::from(timeout());
        assert!(err.is_timeout());
        assert!(err.to_string().starts_with("timed out after 300ms"));
    }

    #[test]
    fn test_nested_timeout_is_recoverable() {
        assert_eq!(E2eError::from(timeout()).classify(), ErrorClass::Recoverable);
    }

    #[test]
    fn test_session_classification_passes_through() {
        let recoverable = E2eError::from(SessionError::NoSuchElement {
            locator: "css=#a".into(),
        });
        assert_eq!(recoverable.classify(), ErrorClass::Recoverable);

        let fatal = E2eError::from(SessionError::Disconnected {
            message: "gone".into(),
        });
        assert_eq!(fatal.classify(), ErrorClass::Fatal);
    }

    #[test]
    fn test_from_poll_error() {
        let err: E2eError = PollError::<SessionError>::Cancelled {
            description: "workspace".into(),
        }
        .into();
        assert!(matches!(err, E2eError::Cancelled { .. }));

        let err: E2eError = PollError::Fatal(SessionError::InvalidSelector {
            locator: "xpath=//[".into(),
            message: "bad".into(),
        })
        .into();
        assert!(matches!(
            err,
            E2eError::Session(SessionError::InvalidSelector { .. })
        ));

        let err: E2eError = PollError::<Infallible>::Timeout(timeout()).into();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: E2eError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
