//! Subprocess execution and the `oc`/`kubectl` wrapper.
//!
//! Cluster-side waits ("the workspace pod is gone", "the route reports
//! Ready") shell out to the cluster CLI and poll its output.
//! [`CommandExecutor`] is the seam; [`ShellExecutor`] is the real thing.

use crate::clock::{Clock, SystemClock};
use crate::config::TestConfig;
use crate::poll::{poll_until_with, wait_absence_with, Classify, ErrorClass, WaitDescriptor};
use crate::result::{E2eError, E2eResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOutput {
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
    /// Exit code; `None` when killed by a signal
    pub exit_code: Option<i32>,
}

impl ExecOutput {
    /// Exited with status zero
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }
}

/// Errors from running a subprocess
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program could not be started at all
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program name
        program: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited non-zero
    #[error("`{command}` exited with code {exit_code}: {stderr}")]
    Failed {
        /// Rendered command line
        command: String,
        /// Exit code
        exit_code: i32,
        /// Trimmed standard error
        stderr: String,
    },

    /// The program was killed by a signal
    #[error("`{command}` was terminated by a signal")]
    Terminated {
        /// Rendered command line
        command: String,
    },

    /// The cluster refused the command itself, e.g. an unknown resource type
    #[error("`{command}` was rejected: {stderr}")]
    Rejected {
        /// Rendered command line
        command: String,
        /// Trimmed standard error
        stderr: String,
    },

    /// The program succeeded but printed something unusable
    #[error("unexpected output from `{command}`: {message}")]
    InvalidOutput {
        /// Rendered command line
        command: String,
        /// What was wrong with it
        message: String,
    },
}

impl Classify for CommandError {
    fn classify(&self) -> ErrorClass {
        match self {
            // API server hiccups and not-yet-created resources both land here
            Self::Failed { .. } => ErrorClass::Recoverable,
            Self::Spawn { .. }
            | Self::Terminated { .. }
            | Self::Rejected { .. }
            | Self::InvalidOutput { .. } => ErrorClass::Fatal,
        }
    }
}

/// stderr fragments from `oc`/`kubectl` that no amount of retrying will fix
const REJECTED_MARKERS: &[&str] = &[
    "doesn't have a resource type",
    "unknown flag",
    "unknown command",
    "unknown shorthand flag",
];

fn render(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs external programs
pub trait CommandExecutor: Send + Sync {
    /// Run `program` with `args` to completion and capture its output
    ///
    /// A non-zero exit is not an error here; see [`Self::exec_checked`].
    fn exec(&self, program: &str, args: &[String]) -> Result<ExecOutput, CommandError>;

    /// Run and turn a non-zero exit into [`CommandError::Failed`]
    fn exec_checked(&self, program: &str, args: &[String]) -> Result<ExecOutput, CommandError> {
        let output = self.exec(program, args)?;
        match output.exit_code {
            Some(0) => Ok(output),
            Some(exit_code) => Err(CommandError::Failed {
                command: render(program, args),
                exit_code,
                stderr: output.stderr.trim().to_string(),
            }),
            None => Err(CommandError::Terminated {
                command: render(program, args),
            }),
        }
    }
}

impl<X: CommandExecutor + ?Sized> CommandExecutor for &X {
    fn exec(&self, program: &str, args: &[String]) -> Result<ExecOutput, CommandError> {
        (**self).exec(program, args)
    }
}

impl<X: CommandExecutor + ?Sized> CommandExecutor for Arc<X> {
    fn exec(&self, program: &str, args: &[String]) -> Result<ExecOutput, CommandError> {
        (**self).exec(program, args)
    }
}

/// [`CommandExecutor`] backed by `std::process::Command`
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor {
    env: Vec<(String, String)>,
    working_dir: Option<PathBuf>,
}

impl ShellExecutor {
    /// Executor inheriting the current environment and directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an extra environment variable for every command
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Run every command in `dir`
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Run a full command line through `sh -c`
    pub fn exec_shell(&self, line: &str) -> Result<ExecOutput, CommandError> {
        self.exec("sh", &["-c".to_string(), line.to_string()])
    }
}

impl CommandExecutor for ShellExecutor {
    fn exec(&self, program: &str, args: &[String]) -> Result<ExecOutput, CommandError> {
        tracing::debug!(command = %render(program, args), "executing");

        let mut cmd = Command::new(program);
        let _ = cmd.args(args);
        for (key, value) in &self.env {
            let _ = cmd.env(key, value);
        }
        if let Some(ref dir) = self.working_dir {
            let _ = cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let result = ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };
        tracing::trace!(exit_code = ?result.exit_code, "command finished");
        Ok(result)
    }
}

/// Which cluster CLI to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CliTool {
    /// OpenShift `oc`
    #[default]
    Oc,
    /// Upstream `kubectl`
    Kubectl,
}

impl CliTool {
    /// Binary name
    #[must_use]
    pub const fn program(self) -> &'static str {
        match self {
            Self::Oc => "oc",
            Self::Kubectl => "kubectl",
        }
    }
}

impl fmt::Display for CliTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl FromStr for CliTool {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "oc" => Ok(Self::Oc),
            "kubectl" => Ok(Self::Kubectl),
            other => Err(E2eError::config(format!(
                "unknown cli tool {other:?} (expected oc or kubectl)"
            ))),
        }
    }
}

/// `oc`/`kubectl` bound to a namespace
pub struct KubernetesCli<X> {
    executor: X,
    tool: CliTool,
    namespace: Option<String>,
    clock: Arc<dyn Clock>,
}

impl<X> fmt::Debug for KubernetesCli<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubernetesCli")
            .field("tool", &self.tool)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl<X: CommandExecutor> KubernetesCli<X> {
    /// Wrap `executor`, without a namespace
    pub fn new(executor: X, tool: CliTool) -> Self {
        Self {
            executor,
            tool,
            namespace: None,
            clock: Arc::new(SystemClock::new()),
        }
    }

    /// Tool and namespace from configuration
    pub fn from_config(executor: X, config: &TestConfig) -> Self {
        let cli = Self::new(executor, config.cli_tool);
        match config.namespace {
            Some(ref ns) => cli.with_namespace(ns.clone()),
            None => cli,
        }
    }

    /// Append `-n <namespace>` to every command
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Poll on `clock` instead of wall time
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Configured tool
    pub const fn tool(&self) -> CliTool {
        self.tool
    }

    /// Configured namespace
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn full_args(&self, args: &[&str]) -> Vec<String> {
        let mut full: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
        if let Some(ref ns) = self.namespace {
            full.push("-n".to_string());
            full.push(ns.clone());
        }
        full
    }

    fn render_args(&self, args: &[&str]) -> String {
        render(self.tool.program(), &self.full_args(args))
    }

    /// Run and return stdout; non-zero exit is an error
    ///
    /// Usage errors such as an unknown resource type are [`CommandError::Rejected`].
    pub fn run(&self, args: &[&str]) -> Result<String, CommandError> {
        let out = self.try_run(args)?;
        if out.success() {
            return Ok(out.stdout);
        }
        Err(self.failure(args, &out))
    }

    fn failure(&self, args: &[&str], out: &ExecOutput) -> CommandError {
        let command = self.render_args(args);
        let stderr = out.stderr.trim().to_string();
        match out.exit_code {
            None => CommandError::Terminated { command },
            Some(_) if REJECTED_MARKERS.iter().any(|m| stderr.contains(m)) => {
                CommandError::Rejected { command, stderr }
            }
            Some(exit_code) => CommandError::Failed {
                command,
                exit_code,
                stderr,
            },
        }
    }

    /// Run and return the raw output whatever the exit code
    pub fn try_run(&self, args: &[&str]) -> Result<ExecOutput, CommandError> {
        self.executor.exec(self.tool.program(), &self.full_args(args))
    }

    /// `get <kind> <name> -o json`, parsed
    pub fn get_json(&self, kind: &str, name: &str) -> E2eResult<serde_json::Value> {
        let args = ["get", kind, name, "-o", "json"];
        let stdout = self.run(&args)?;
        serde_json::from_str(&stdout).map_err(|e| {
            E2eError::Command(CommandError::InvalidOutput {
                command: self.render_args(&args),
                message: e.to_string(),
            })
        })
    }

    /// Whether `kind/name` exists
    ///
    /// A `NotFound` failure means "no". An unknown resource type is
    /// [`CommandError::Rejected`]; other failures are retryable errors.
    pub fn exists(&self, kind: &str, name: &str) -> Result<bool, CommandError> {
        let args = ["get", kind, name, "--ignore-not-found", "-o", "name"];
        let out = self.try_run(&args)?;
        if out.success() {
            return Ok(!out.stdout.trim().is_empty());
        }
        if out.stderr.contains("NotFound") || out.stderr.contains("not found") {
            return Ok(false);
        }
        Err(self.failure(&args, &out))
    }

    /// Poll `args` until `matcher` accepts stdout; returns that stdout
    ///
    /// Non-zero exits are retried until the deadline.
    pub fn wait_for_output(
        &self,
        args: &[&str],
        matcher: impl Fn(&str) -> bool,
        descriptor: &WaitDescriptor,
    ) -> E2eResult<String> {
        let descriptor = if descriptor.description.is_some() {
            descriptor.clone()
        } else {
            descriptor
                .clone()
                .with_description(format!("output of `{}`", self.render_args(args)))
        };
        let stdout = poll_until_with(
            &*self.clock,
            || self.run(args).map(|out| matcher(&out).then_some(out)),
            &descriptor,
        )?;
        Ok(stdout)
    }

    /// Poll until `kind/name` no longer exists
    pub fn wait_for_absence(
        &self,
        kind: &str,
        name: &str,
        descriptor: &WaitDescriptor,
    ) -> E2eResult<()> {
        let descriptor = if descriptor.description.is_some() {
            descriptor.clone()
        } else {
            descriptor
                .clone()
                .with_description(format!("{kind}/{name} to be deleted"))
        };
        tracing::info!(kind, name, "waiting for resource deletion");
        wait_absence_with(&*self.clock, || self.exists(kind, name), &descriptor)?;
        Ok(())
    }
}
