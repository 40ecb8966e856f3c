//! Per-run state shared between test steps.

use crate::config::{TestConfig, TimeoutKind};
use crate::poll::WaitDescriptor;
use std::sync::Arc;
use uuid::Uuid;

/// State for one end-to-end test run
///
/// Created once per run and passed to the steps that need it. Holds the
/// resolved configuration and the name of the most recently created
/// workspace so cleanup steps can find it.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: Uuid,
    config: Arc<TestConfig>,
    latest_workspace: Option<String>,
}

impl RunContext {
    /// New run with a fresh id
    #[must_use]
    pub fn new(config: TestConfig) -> Self {
        Self::with_shared_config(Arc::new(config))
    }

    /// New run sharing an already-resolved configuration
    #[must_use]
    pub fn with_shared_config(config: Arc<TestConfig>) -> Self {
        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, url = %config.dashboard_url, "starting test run");
        Self {
            run_id,
            config,
            latest_workspace: None,
        }
    }

    /// Unique id of this run
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Resolved configuration
    #[must_use]
    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// Shared handle to the configuration
    #[must_use]
    pub fn shared_config(&self) -> Arc<TestConfig> {
        Arc::clone(&self.config)
    }

    /// Remember `name` as the most recently created workspace
    pub fn register_workspace(&mut self, name: impl Into<String>) {
        let name = name.into();
        tracing::debug!(run_id = %self.run_id, workspace = %name, "workspace registered");
        self.latest_workspace = Some(name);
    }

    /// Most recently created workspace, if any
    #[must_use]
    pub fn latest_workspace(&self) -> Option<&str> {
        self.latest_workspace.as_deref()
    }

    /// Take the most recently created workspace, leaving none behind
    pub fn take_latest_workspace(&mut self) -> Option<String> {
        self.latest_workspace.take()
    }

    /// Descriptor for a `kind` wait using this run's configuration
    #[must_use]
    pub fn wait_descriptor(
        &self,
        kind: TimeoutKind,
        description: impl Into<String>,
    ) -> WaitDescriptor {
        self.config.wait(kind, description)
    }

    /// Short name unique to this run, e.g. for workspace names
    #[must_use]
    pub fn unique_name(&self, prefix: &str) -> String {
        let simple = self.run_id.simple().to_string();
        format!("{prefix}-{}", &simple[..8])
    }
}
