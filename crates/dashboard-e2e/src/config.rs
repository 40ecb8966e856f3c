//! Typed test configuration.
//!
//! Resolved once at start-up, then passed around explicitly (usually inside
//! a [`RunContext`](crate::RunContext)). Sources, lowest priority first:
//!
//! 1. built-in defaults
//! 2. a YAML file (`from_yaml_file`)
//! 3. `DASHBOARD_E2E_*` environment variables (`overlay_env`)

use crate::executor::CliTool;
use crate::poll::WaitDescriptor;
use crate::result::{E2eError, E2eResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Prefix shared by every environment variable this crate reads
pub const ENV_PREFIX: &str = "DASHBOARD_E2E_";

/// Which timeout budget a wait should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutKind {
    /// General-purpose waits
    Default,
    /// Element presence and visibility
    Element,
    /// Waiting for something to become clickable
    Click,
    /// Workspace start-up
    WorkspaceStart,
    /// Cluster CLI waits
    Cli,
}

/// Timeout budgets in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// General-purpose waits
    pub default_ms: u64,
    /// Element presence and visibility
    pub element_ms: u64,
    /// Waiting for something to become clickable
    pub click_ms: u64,
    /// Workspace start-up
    pub workspace_start_ms: u64,
    /// Cluster CLI waits
    pub cli_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_ms: 120_000,
            element_ms: 20_000,
            click_ms: 10_000,
            workspace_start_ms: 360_000,
            cli_ms: 60_000,
        }
    }
}

impl TimeoutConfig {
    /// Budget for `kind`
    #[must_use]
    pub const fn get(&self, kind: TimeoutKind) -> Duration {
        let ms = match kind {
            TimeoutKind::Default => self.default_ms,
            TimeoutKind::Element => self.element_ms,
            TimeoutKind::Click => self.click_ms,
            TimeoutKind::WorkspaceStart => self.workspace_start_ms,
            TimeoutKind::Cli => self.cli_ms,
        };
        Duration::from_millis(ms)
    }
}

/// Polling cadence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between attempts
    pub interval_ms: u64,
    /// Attempts used by attempt-style waits such as disappearance
    pub disappearance_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            disappearance_attempts: 5,
        }
    }
}

impl PollingConfig {
    /// Interval as a duration
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Everything a test run needs to know about its environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Dashboard base URL
    pub dashboard_url: String,
    /// Namespace the workspaces live in
    pub namespace: Option<String>,
    /// Which cluster CLI to shell out to
    pub cli_tool: CliTool,
    /// Timeout budgets
    pub timeouts: TimeoutConfig,
    /// Polling cadence
    pub polling: PollingConfig,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            dashboard_url: "https://localhost/dashboard/".to_string(),
            namespace: None,
            cli_tool: CliTool::Oc,
            timeouts: TimeoutConfig::default(),
            polling: PollingConfig::default(),
        }
    }
}

impl TestConfig {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> E2eResult<Self> {
        Self::default().overlay_env()
    }

    /// Defaults overlaid with variables from `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> E2eResult<Self> {
        Self::default().overlay_lookup(lookup)
    }

    /// Overlay the process environment onto this config
    pub fn overlay_env(self) -> E2eResult<Self> {
        self.overlay_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay `DASHBOARD_E2E_*` variables from `lookup`, then validate
    pub fn overlay_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> E2eResult<Self> {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = get("URL") {
            self.dashboard_url = url;
        }
        if let Some(ns) = get("NAMESPACE") {
            self.namespace = Some(ns);
        }
        if let Some(tool) = get("CLI_TOOL") {
            self.cli_tool = tool.parse()?;
        }

        let timeouts = &mut self.timeouts;
        for (name, slot) in [
            ("DEFAULT_TIMEOUT_MS", &mut timeouts.default_ms),
            ("ELEMENT_TIMEOUT_MS", &mut timeouts.element_ms),
            ("CLICK_TIMEOUT_MS", &mut timeouts.click_ms),
            ("WORKSPACE_START_TIMEOUT_MS", &mut timeouts.workspace_start_ms),
            ("CLI_TIMEOUT_MS", &mut timeouts.cli_ms),
            ("POLLING_INTERVAL_MS", &mut self.polling.interval_ms),
        ] {
            if let Some(raw) = get(name) {
                *slot = parse_number(name, &raw)?;
            }
        }
        if let Some(raw) = get("DISAPPEARANCE_ATTEMPTS") {
            self.polling.disappearance_attempts = parse_number("DISAPPEARANCE_ATTEMPTS", &raw)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Parse a YAML document; missing fields take their defaults
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(yaml: &str) -> E2eResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| E2eError::config(format!("invalid YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file
    #[cfg(feature = "yaml")]
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> E2eResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading test configuration");
        Self::from_yaml_str(&content)
    }

    /// Reject configurations that would make every wait fail
    pub fn validate(&self) -> E2eResult<()> {
        if self.dashboard_url.trim().is_empty() {
            return Err(E2eError::config("dashboard_url must not be empty"));
        }
        let t = &self.timeouts;
        for (name, value) in [
            ("timeouts.default_ms", t.default_ms),
            ("timeouts.element_ms", t.element_ms),
            ("timeouts.click_ms", t.click_ms),
            ("timeouts.workspace_start_ms", t.workspace_start_ms),
            ("timeouts.cli_ms", t.cli_ms),
            ("polling.interval_ms", self.polling.interval_ms),
        ] {
            if value == 0 {
                return Err(E2eError::config(format!("{name} must be greater than zero")));
            }
        }
        if self.polling.disappearance_attempts == 0 {
            return Err(E2eError::config(
                "polling.disappearance_attempts must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Descriptor for a `kind` wait at the configured cadence
    #[must_use]
    pub fn wait(&self, kind: TimeoutKind, description: impl Into<String>) -> WaitDescriptor {
        WaitDescriptor::new(self.timeouts.get(kind), self.polling.interval())
            .with_description(description)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> E2eResult<T> {
    raw.parse().map_err(|_| {
        E2eError::config(format!(
            "{ENV_PREFIX}{name} must be a non-negative integer, got {raw:?}"
        ))
    })
}
