//! Browser session abstraction.
//!
//! [`Session`] is the seam between the wait helpers and whatever actually
//! drives the browser. Helpers never talk to a WebDriver client directly;
//! they go through this trait, so a real remote session and
//! [`MockSession`] are interchangeable.

pub mod mock;

pub use mock::{MockElement, MockSession};

use crate::locator::Locator;
use crate::poll::{Classify, ErrorClass};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reference to an element found by a session
///
/// Handles go stale when the element they point at is removed from the DOM.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Session-specific element id
    pub id: String,
    /// Locator the element was found with
    pub locator: Locator,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, locator: Locator) -> Self {
        Self {
            id: id.into(),
            locator,
        }
    }
}

/// Errors reported by a browser session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Nothing matches the locator (yet)
    #[error("no such element: {locator}")]
    NoSuchElement {
        /// Locator that was searched
        locator: String,
    },

    /// The element was detached from the DOM after it was found
    #[error("stale element reference: {locator}")]
    StaleElement {
        /// Locator the handle came from
        locator: String,
    },

    /// The element exists but cannot receive input right now
    #[error("element not interactable: {locator}")]
    NotInteractable {
        /// Locator of the element
        locator: String,
    },

    /// The locator itself is malformed
    #[error("invalid selector {locator}: {message}")]
    InvalidSelector {
        /// Offending locator
        locator: String,
        /// Driver message
        message: String,
    },

    /// The browser session is gone
    #[error("session disconnected: {message}")]
    Disconnected {
        /// Driver message
        message: String,
    },

    /// The session does not support the requested command
    #[error("unsupported operation: {message}")]
    Unsupported {
        /// Driver message
        message: String,
    },
}

impl SessionError {
    /// Create a no-such-element error
    #[must_use]
    pub fn no_such_element(locator: &Locator) -> Self {
        Self::NoSuchElement {
            locator: locator.to_string(),
        }
    }

    /// Create a stale element error
    #[must_use]
    pub fn stale(locator: &Locator) -> Self {
        Self::StaleElement {
            locator: locator.to_string(),
        }
    }

    /// Create a not-interactable error
    #[must_use]
    pub fn not_interactable(locator: &Locator) -> Self {
        Self::NotInteractable {
            locator: locator.to_string(),
        }
    }
}

impl Classify for SessionError {
    fn classify(&self) -> ErrorClass {
        match self {
            Self::NoSuchElement { .. } | Self::StaleElement { .. } | Self::NotInteractable { .. } => {
                ErrorClass::Recoverable
            }
            Self::InvalidSelector { .. } | Self::Disconnected { .. } | Self::Unsupported { .. } => {
                ErrorClass::Fatal
            }
        }
    }
}

/// A WebDriver-like browser session
#[async_trait]
pub trait Session: Send + Sync {
    /// Find the first element matching `locator`
    async fn find_element(&self, locator: &Locator) -> Result<ElementHandle, SessionError>;

    /// Find every element matching `locator`; empty when nothing matches
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementHandle>, SessionError>;

    /// Whether the element is rendered and visible
    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, SessionError>;

    /// Whether the element accepts input
    async fn is_enabled(&self, element: &ElementHandle) -> Result<bool, SessionError>;

    /// Click the element
    async fn click(&self, element: &ElementHandle) -> Result<(), SessionError>;

    /// Visible text of the element
    async fn text(&self, element: &ElementHandle) -> Result<String, SessionError>;

    /// Attribute value, `None` when the attribute is absent
    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, SessionError>;

    /// Type into the element
    async fn send_keys(&self, element: &ElementHandle, keys: &str) -> Result<(), SessionError>;

    /// Clear an input element
    async fn clear(&self, element: &ElementHandle) -> Result<(), SessionError>;

    /// URL of the current page
    async fn current_url(&self) -> Result<String, SessionError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        let locator = Locator::css("#a");
        assert!(SessionError::no_such_element(&locator).is_recoverable());
        assert!(SessionError::stale(&locator).is_recoverable());
        assert!(SessionError::not_interactable(&locator).is_recoverable());
    }

    #[test]
    fn test_fatal_errors() {
        let invalid = SessionError::InvalidSelector {
            locator: "xpath=//[".into(),
            message: "unexpected token".into(),
        };
        assert_eq!(invalid.classify(), ErrorClass::Fatal);
        assert_eq!(
            SessionError::Disconnected {
                message: "closed".into()
            }
            .classify(),
            ErrorClass::Fatal
        );
        assert_eq!(
            SessionError::Unsupported {
                message: "frames".into()
            }
            .classify(),
            ErrorClass::Fatal
        );
    }

    #[test]
    fn test_error_display_names_locator() {
        let err = SessionError::no_such_element(&Locator::id("loader"));
        assert_eq!(err.to_string(), "no such element: id=loader");
    }

    #[test]
    fn test_element_handle() {
        let handle = ElementHandle::new("el-1", Locator::css("button"));
        assert_eq!(handle.id, "el-1");
        assert_eq!(handle.locator, Locator::css("button"));
    }
}
