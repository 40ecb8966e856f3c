//! Element locators.
//!
//! Mirrors the WebDriver location strategies. `Id`, `Name` and `TestId`
//! are lowered to CSS, which is what the W3C protocol accepts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How to find an element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "using", content = "value", rename_all = "snake_case")]
pub enum Locator {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath expression
    #[serde(rename = "xpath")]
    XPath(String),
    /// Element id attribute
    Id(String),
    /// Element name attribute
    Name(String),
    /// Exact link text
    LinkText(String),
    /// `data-testid` attribute
    TestId(String),
}

impl Locator {
    /// Create a CSS locator
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath locator
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    /// Create an id locator
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Create a name locator
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Create a link text locator
    #[must_use]
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::LinkText(text.into())
    }

    /// Create a test id locator
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// W3C WebDriver `(using, value)` pair for this locator
    #[must_use]
    pub fn strategy(&self) -> (&'static str, String) {
        match self {
            Self::Css(s) => ("css selector", s.clone()),
            Self::XPath(s) => ("xpath", s.clone()),
            Self::Id(id) => ("css selector", format!("#{}", css_escape(id))),
            Self::Name(name) => ("css selector", format!("[name=\"{}\"]", css_escape(name))),
            Self::LinkText(text) => ("link text", text.clone()),
            Self::TestId(id) => (
                "css selector",
                format!("[data-testid=\"{}\"]", css_escape(id)),
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
            Self::Id(s) => write!(f, "id={s}"),
            Self::Name(s) => write!(f, "name={s}"),
            Self::LinkText(s) => write!(f, "link={s}"),
            Self::TestId(s) => write!(f, "testid={s}"),
        }
    }
}

fn css_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '#' | '.' | ':' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
