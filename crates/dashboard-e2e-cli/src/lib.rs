//! dashboard-e2e CLI library
//!
//! Shell-level access to the same bounded waits the test suites use, for
//! pipeline steps such as "wait until the operator pod is Running" or "wait
//! until the workspace namespace is gone".

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
pub mod wait;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, ConfigFormat, TimingArgs, WaitAbsentArgs, WaitForArgs,
};
pub use config::{load_test_config, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
pub use wait::OutputMatcher;
