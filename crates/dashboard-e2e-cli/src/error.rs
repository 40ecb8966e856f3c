//! Error types for the CLI

use dashboard_e2e::E2eError;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Output serialization error
    #[error("Failed to render output: {message}")]
    Render {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Library error, including wait timeouts
    #[error(transparent)]
    E2e(#[from] E2eError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a render error
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Process exit code: 2 for a timed-out wait, 1 for anything else
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::E2e(e) if e.is_timeout() => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use dashboard_e2e::TimeoutError;
    use std::time::Duration;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad config");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad config"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_invalid_argument_error() {
        let err = CliError::invalid_argument("bad arg");
        assert!(err.to_string().contains("Invalid argument"));
    }

    #[test]
    fn test_render_error() {
        let err = CliError::render("yaml");
        assert!(err.to_string().contains("render"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.to_string().contains("I/O"));
    }

    #[test]
    fn test_timeout_exit_code() {
        let timeout = TimeoutError {
            timeout: Duration::from_secs(1),
            elapsed: Duration::from_secs(1),
            attempts: 2,
            description: Some("pods".into()),
            last_error: None,
        };
        let err = CliError::from(E2eError::from(timeout));
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().starts_with("timed out after 1000ms"));
    }
}
