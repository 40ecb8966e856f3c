//! Command-polling waits behind `wait-for` and `wait-absent`.

use crate::commands::TimingArgs;
use crate::error::{CliError, CliResult};
use dashboard_e2e::{
    poll_until_with, wait_absence_with, Clock, CommandError, CommandExecutor, E2eError,
    ExecOutput, TestConfig, WaitDescriptor,
};
use regex::Regex;
use std::fmt;
use std::time::Duration;

/// What counts as a match in a command's output
#[derive(Debug, Clone)]
pub enum OutputMatcher {
    /// Stdout contains the text
    Contains(String),
    /// Stdout matches the regular expression
    Matches(Regex),
    /// The command exits with status 0
    Success,
}

impl OutputMatcher {
    /// Build from the optional `contains`/`matches` flags; neither means [`Self::Success`]
    pub fn from_flags(contains: Option<&str>, matches: Option<&str>) -> CliResult<Self> {
        match (contains, matches) {
            (Some(_), Some(_)) => Err(CliError::invalid_argument(
                "use either a substring or a regex, not both",
            )),
            (Some(text), None) => Ok(Self::Contains(text.to_string())),
            (None, Some(pattern)) => Regex::new(pattern)
                .map(Self::Matches)
                .map_err(|e| CliError::invalid_argument(format!("invalid regex: {e}"))),
            (None, None) => Ok(Self::Success),
        }
    }

    /// Whether `output` satisfies this matcher
    #[must_use]
    pub fn is_match(&self, output: &ExecOutput) -> bool {
        match self {
            Self::Contains(text) => output.stdout.contains(text.as_str()),
            Self::Matches(re) => re.is_match(&output.stdout),
            Self::Success => output.success(),
        }
    }
}

impl fmt::Display for OutputMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains(text) => write!(f, "output containing {text:?}"),
            Self::Matches(re) => write!(f, "output matching /{re}/"),
            Self::Success => write!(f, "exit code 0"),
        }
    }
}

/// Build the descriptor from flags, falling back to `config`
pub fn descriptor(
    timing: &TimingArgs,
    config: &TestConfig,
    default_label: String,
) -> WaitDescriptor {
    let interval = timing
        .interval
        .map_or_else(|| config.polling.interval(), Duration::from_millis);
    let descriptor = match (timing.attempts, timing.timeout) {
        (Some(attempts), _) => WaitDescriptor::from_attempts(attempts, interval),
        (None, Some(ms)) => WaitDescriptor::new(Duration::from_millis(ms), interval),
        (None, None) => {
            WaitDescriptor::new(Duration::from_millis(config.timeouts.cli_ms), interval)
        }
    };
    descriptor.with_description(timing.description.clone().unwrap_or(default_label))
}

fn split(command: &[String]) -> CliResult<(&str, &[String])> {
    command
        .split_first()
        .map(|(program, args)| (program.as_str(), args))
        .ok_or_else(|| CliError::invalid_argument("no command given"))
}

/// Re-run `command` until `matcher` accepts its output
///
/// A non-zero exit that does not match is retried and reported as the last
/// error if the wait times out. A command that cannot be started is fatal.
pub fn wait_for_output<X: CommandExecutor>(
    executor: &X,
    clock: &dyn Clock,
    command: &[String],
    matcher: &OutputMatcher,
    descriptor: &WaitDescriptor,
) -> CliResult<ExecOutput> {
    let (program, args) = split(command)?;
    let output = poll_until_with(
        clock,
        || {
            let out = executor.exec(program, args)?;
            if matcher.is_match(&out) {
                return Ok(Some(out));
            }
            if out.success() {
                return Ok(None);
            }
            Err(CommandError::Failed {
                command: command.join(" "),
                exit_code: out.exit_code.unwrap_or(-1),
                stderr: out.stderr.trim().to_string(),
            })
        },
        descriptor,
    )
    .map_err(E2eError::from)?;
    Ok(output)
}

/// Re-run `command` until `matcher` no longer accepts its output
pub fn wait_for_absence<X: CommandExecutor>(
    executor: &X,
    clock: &dyn Clock,
    command: &[String],
    matcher: &OutputMatcher,
    descriptor: &WaitDescriptor,
) -> CliResult<()> {
    let (program, args) = split(command)?;
    wait_absence_with(
        clock,
        || executor.exec(program, args).map(|out| matcher.is_match(&out)),
        descriptor,
    )
    .map_err(E2eError::from)?;
    Ok(())
}
