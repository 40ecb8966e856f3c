//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// dashboard-e2e: bounded waits for dashboard end-to-end pipelines
#[derive(Parser, Debug)]
#[command(name = "dashboard-e2e")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// YAML test configuration file
    #[arg(long, global = true, env = "DASHBOARD_E2E_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Re-run a command until its output matches
    WaitFor(WaitForArgs),

    /// Re-run a command until its output no longer matches
    WaitAbsent(WaitAbsentArgs),

    /// Show the resolved test configuration
    Config(ConfigArgs),
}

/// How long to wait and how often to look
#[derive(Args, Debug, Clone, Default)]
pub struct TimingArgs {
    /// Budget in milliseconds [default: configured CLI timeout]
    #[arg(long, value_name = "MS", conflicts_with = "attempts")]
    pub timeout: Option<u64>,

    /// Delay between attempts in milliseconds [default: configured polling interval]
    #[arg(long, value_name = "MS")]
    pub interval: Option<u64>,

    /// Budget as a number of attempts instead of a timeout
    #[arg(long)]
    pub attempts: Option<u32>,

    /// Label used in progress and timeout messages
    #[arg(short, long)]
    pub description: Option<String>,
}

/// Arguments for the wait-for command
#[derive(Args, Debug)]
pub struct WaitForArgs {
    /// Succeed once stdout contains this text
    #[arg(long, value_name = "TEXT", conflicts_with = "until_matches")]
    pub until_contains: Option<String>,

    /// Succeed once stdout matches this regular expression
    #[arg(long, value_name = "REGEX")]
    pub until_matches: Option<String>,

    /// Timing options
    #[command(flatten)]
    pub timing: TimingArgs,

    /// Command to poll (after `--`); without a matcher, exit code 0 succeeds
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Arguments for the wait-absent command
#[derive(Args, Debug)]
pub struct WaitAbsentArgs {
    /// Succeed once stdout no longer contains this text
    #[arg(
        long,
        value_name = "TEXT",
        conflicts_with = "matches",
        required_unless_present = "matches"
    )]
    pub contains: Option<String>,

    /// Succeed once stdout no longer matches this regular expression
    #[arg(long, value_name = "REGEX")]
    pub matches: Option<String>,

    /// Timing options
    #[command(flatten)]
    pub timing: TimingArgs,

    /// Command to poll (after `--`)
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Output format
    #[arg(long, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Config output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    /// YAML
    #[default]
    Yaml,
    /// JSON
    Json,
}

/// Color argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
