//! Load-test pipeline
//!
//! Runs the four stages in series: provision, inject, execute, parse. Each
//! stage either completes or fails the whole invocation; only the readiness
//! poll inside provisioning retries anything. Live runs are tracked in a
//! registry so callers can list and tear them down later.

use crate::container::{
    ContainerConfig, ContainerRuntime, Docker, LifecycleManager, RuntimeHandle, ScriptInjector,
};
use crate::error::{Result, StampedeError};
use crate::report::{self, ParseOptions, TestRun};
use crate::runner::K6Executor;
use indexmap::IndexMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use uuid::Uuid;

/// Pipeline-level tunables.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub container: ContainerConfig,
    /// Maximum concurrent runs; provisioning beyond this waits for a slot.
    pub capacity: usize,
    /// Default test window for the requests-per-second fallback.
    pub parse_window: Duration,
    /// Remove the container once a run completes cleanly. Off by default so
    /// the instance stays available for inspection.
    pub teardown_on_success: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            container: ContainerConfig::default(),
            capacity: 1,
            parse_window: Duration::from_secs(10),
            teardown_on_success: false,
        }
    }
}

/// Orchestrates load-test runs over a container runtime.
pub struct LoadTestPipeline<R: ContainerRuntime> {
    lifecycle: LifecycleManager<R>,
    registry: Mutex<IndexMap<Uuid, RuntimeHandle>>,
    permits: Semaphore,
    config: PipelineConfig,
}

impl LoadTestPipeline<Docker> {
    /// Pipeline over the local `docker` binary.
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_runtime(Docker::new(), config)
    }
}

impl<R: ContainerRuntime> LoadTestPipeline<R> {
    pub fn with_runtime(runtime: R, config: PipelineConfig) -> Self {
        Self {
            lifecycle: LifecycleManager::new(runtime, config.container.clone()),
            registry: Mutex::new(IndexMap::new()),
            permits: Semaphore::new(config.capacity),
            config,
        }
    }

    /// Run the whole pipeline for one repository and script.
    ///
    /// `window` is the script's configured duration, used only for the
    /// requests-per-second fallback; `None` takes the configured default.
    /// On failure the container (if provisioned) stays registered so it can
    /// be inspected post-mortem.
    pub async fn execute(
        &self,
        repo_path: &Path,
        script_text: &str,
        window: Option<Duration>,
    ) -> Result<TestRun> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| StampedeError::CapacityExhausted)?;

        let handle = self.lifecycle.provision(repo_path).await?;
        self.registry
            .lock()
            .await
            .insert(handle.run_id, handle.clone());

        ScriptInjector::new(&self.lifecycle)
            .inject(repo_path, script_text, &handle)
            .await?;

        let raw = K6Executor::new(&self.lifecycle).run(&handle).await?;

        let options = ParseOptions {
            window: window.unwrap_or(self.config.parse_window),
        };
        let run = report::parse_with_options(raw.as_str(), &options);

        if self.config.teardown_on_success {
            self.teardown(handle.run_id).await?;
        }

        Ok(run)
    }

    /// Handles of all live runs, oldest first.
    pub async fn live_runs(&self) -> Vec<RuntimeHandle> {
        self.registry.lock().await.values().cloned().collect()
    }

    /// Remove a live run's container and forget it.
    pub async fn teardown(&self, run_id: Uuid) -> Result<()> {
        let handle = self
            .registry
            .lock()
            .await
            .shift_remove(&run_id)
            .ok_or(StampedeError::RunNotFound { run_id })?;

        self.lifecycle.teardown(&handle).await
    }
}
