//! dashboard-e2e: bounded waits for cloud workspace dashboard end-to-end tests
//!
//! Browser UIs and clusters converge asynchronously. Every check in an
//! end-to-end suite is therefore "wait until this becomes true, but not
//! forever". This crate provides that primitive and the collaborators built
//! on top of it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    dashboard-e2e                              │
//! ├──────────────────────────────────────────────────────────────┤
//! │  DriverHelper ──► Session (WebDriver-like, async)            │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  Poller ◄── WaitDescriptor ◄── TestConfig / RunContext       │
//! │       ▲                                                      │
//! │       │                                                      │
//! │  KubernetesCli ──► CommandExecutor (oc / kubectl)            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`poll_until`] and [`poll_until_async`] retry a predicate until it is
//!   ready, a fatal error occurs, or the budget runs out.
//! - [`wait_absence`] is the negated form.
//! - Timeouts carry the configured budget and description in a
//!   [`TimeoutError`].

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

pub mod clock;
pub mod config;
pub mod context;
#[allow(clippy::missing_errors_doc)]
pub mod executor;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod helper;
pub mod locator;
#[allow(clippy::missing_errors_doc)]
pub mod poll;
mod result;
pub mod session;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{PollingConfig, TestConfig, TimeoutConfig, TimeoutKind, ENV_PREFIX};
pub use context::RunContext;
pub use executor::{
    CliTool, CommandError, CommandExecutor, ExecOutput, KubernetesCli, ShellExecutor,
};
pub use helper::DriverHelper;
pub use locator::Locator;
pub use poll::{
    poll_until, poll_until_async, poll_until_with, wait_absence, wait_absence_async,
    wait_absence_with, Classify, ErrorClass, PollError, Poller, Probe, Readiness, TimeoutError,
    WaitDescriptor, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT,
};
pub use result::{E2eError, E2eResult};
pub use session::{ElementHandle, MockElement, MockSession, Session, SessionError};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        poll_until, poll_until_async, wait_absence, wait_absence_async, Classify, DriverHelper,
        E2eError, E2eResult, ErrorClass, Locator, PollError, Poller, Session, TestConfig,
        TimeoutError, WaitDescriptor,
    };
}
