//! Container lifecycle management
//!
//! Provisions one isolated Docker runtime per load-test run, polls it for
//! readiness, and tears it down on request. Runs never share a container:
//! every handle carries a generated name, so concurrent pipelines cannot
//! collide on a fixed instance.

pub mod inject;

pub use inject::ScriptInjector;

use crate::error::{ProvisionStage, Result, StampedeError};
use serde::Serialize;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;
use tokio::process::Command;
use uuid::Uuid;

/// File name of the injected script, on the host and in the container.
pub const TEST_SCRIPT_NAME: &str = "test-script.js";

/// Directory inside the container that receives the script.
pub const CONTAINER_SCRIPT_DIR: &str = "/app/load-test";

/// Identifies one provisioned runtime instance.
///
/// Created at the start of `provision`; lives until `teardown` or process
/// exit. Not persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeHandle {
    pub run_id: Uuid,
    pub name: String,
    pub host_port: u16,
}

/// Tunables for provisioning and readiness.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Prefix for generated image tags.
    pub image_prefix: String,
    /// Prefix for generated container names.
    pub name_prefix: String,
    /// First host port to bind; subsequent runs take the next port up.
    pub base_host_port: u16,
    /// Port the service listens on inside the container.
    pub container_port: u16,
    /// Delay between readiness polls.
    pub poll_interval: Duration,
    /// Number of readiness polls before giving up.
    pub max_ready_attempts: u32,
    /// Deadline for the image build, `None` for unbounded.
    pub build_deadline: Option<Duration>,
    /// Deadline for the load-test run itself, `None` for unbounded.
    pub exec_deadline: Option<Duration>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            image_prefix: "stampede-api".to_string(),
            name_prefix: "stampede-run".to_string(),
            base_host_port: 8000,
            container_port: 3000,
            poll_interval: Duration::from_secs(2),
            max_ready_attempts: 10,
            build_deadline: Some(Duration::from_secs(600)),
            exec_deadline: Some(Duration::from_secs(300)),
        }
    }
}

impl ContainerConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_ready_attempts(mut self, attempts: u32) -> Self {
        self.max_ready_attempts = attempts;
        self
    }

    pub fn with_base_host_port(mut self, port: u16) -> Self {
        self.base_host_port = port;
        self
    }
}

/// Captured output of one container-runtime invocation.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl From<std::process::Output> for ExecOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Typed interface to the container runtime.
///
/// Every operation takes plain argument values, never an interpolated shell
/// string, so paths and names cannot smuggle shell syntax.
pub trait ContainerRuntime: Send + Sync {
    fn build_image(
        &self,
        tag: &str,
        context: &Path,
    ) -> impl Future<Output = Result<ExecOutput>> + Send;

    fn start_detached(
        &self,
        name: &str,
        image: &str,
        host_port: u16,
        container_port: u16,
    ) -> impl Future<Output = Result<ExecOutput>> + Send;

    fn is_running(&self, name: &str) -> impl Future<Output = Result<bool>> + Send;

    fn exec(&self, name: &str, cmd: &[&str]) -> impl Future<Output = Result<ExecOutput>> + Send;

    fn copy_in(
        &self,
        src: &Path,
        name: &str,
        dest: &str,
    ) -> impl Future<Output = Result<ExecOutput>> + Send;

    fn remove(&self, name: &str) -> impl Future<Output = Result<ExecOutput>> + Send;
}

/// `ContainerRuntime` backed by the `docker` binary.
#[derive(Debug, Clone, Default)]
pub struct Docker;

impl Docker {
    pub fn new() -> Self {
        Self
    }

    async fn docker(&self, args: &[&str]) -> Result<ExecOutput> {
        let output = Command::new("docker").args(args).output().await?;
        Ok(output.into())
    }
}

impl ContainerRuntime for Docker {
    async fn build_image(&self, tag: &str, context: &Path) -> Result<ExecOutput> {
        let output = Command::new("docker")
            .args(["build", "-t", tag])
            .arg(context)
            .output()
            .await?;
        Ok(output.into())
    }

    async fn start_detached(
        &self,
        name: &str,
        image: &str,
        host_port: u16,
        container_port: u16,
    ) -> Result<ExecOutput> {
        let ports = format!("{}:{}", host_port, container_port);
        self.docker(&["run", "-d", "-p", &ports, "--name", name, image])
            .await
    }

    async fn is_running(&self, name: &str) -> Result<bool> {
        let filter = format!("name={}", name);
        let output = self.docker(&["ps", "-q", "-f", &filter]).await?;
        Ok(!output.stdout.trim().is_empty())
    }

    async fn exec(&self, name: &str, cmd: &[&str]) -> Result<ExecOutput> {
        let mut args = vec!["exec", name];
        args.extend_from_slice(cmd);
        self.docker(&args).await
    }

    async fn copy_in(&self, src: &Path, name: &str, dest: &str) -> Result<ExecOutput> {
        let target = format!("{}:{}", name, dest);
        let output = Command::new("docker")
            .arg("cp")
            .arg(src)
            .arg(&target)
            .output()
            .await?;
        Ok(output.into())
    }

    async fn remove(&self, name: &str) -> Result<ExecOutput> {
        self.docker(&["rm", "-f", name]).await
    }
}

/// Provisions, polls, and removes runtime instances.
pub struct LifecycleManager<R: ContainerRuntime> {
    runtime: R,
    config: ContainerConfig,
    next_port_offset: AtomicU16,
}

impl<R: ContainerRuntime> LifecycleManager<R> {
    pub fn new(runtime: R, config: ContainerConfig) -> Self {
        Self {
            runtime,
            config,
            next_port_offset: AtomicU16::new(0),
        }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Build an image from the repository's `server` directory and start one
    /// detached instance of it.
    ///
    /// The start command returning does not mean the service is up, so the
    /// readiness poll runs before the handle is handed out.
    pub async fn provision(&self, repo_path: &Path) -> Result<RuntimeHandle> {
        let run_id = Uuid::new_v4();
        let suffix = run_id.simple().to_string();
        let name = format!("{}-{}", self.config.name_prefix, suffix);
        let image = format!("{}:{}", self.config.image_prefix, suffix);
        let host_port = self
            .config
            .base_host_port
            .wrapping_add(self.next_port_offset.fetch_add(1, Ordering::Relaxed));

        let server_dir = repo_path.join("server");
        tracing::info!(container = %name, context = %server_dir.display(), "Building image");

        let build = with_deadline(
            "build",
            self.config.build_deadline,
            self.runtime.build_image(&image, &server_dir),
        )
        .await?;
        if !build.success {
            return Err(StampedeError::Provision {
                stage: ProvisionStage::Build,
                stderr: build.stderr,
            });
        }

        tracing::info!(container = %name, port = host_port, "Starting container");
        let start = self
            .runtime
            .start_detached(&name, &image, host_port, self.config.container_port)
            .await?;
        if !start.success {
            return Err(StampedeError::Provision {
                stage: ProvisionStage::Start,
                stderr: start.stderr,
            });
        }

        let handle = RuntimeHandle {
            run_id,
            name,
            host_port,
        };
        self.await_ready(&handle).await?;
        Ok(handle)
    }

    /// Poll until the instance is listed as running.
    ///
    /// Makes exactly `max_ready_attempts` polls, sleeping `poll_interval`
    /// after each miss, then fails hard. Every stage that touches the
    /// container calls this first rather than trusting an earlier success;
    /// slow entrypoints can report running and still die a moment later.
    pub async fn await_ready(&self, handle: &RuntimeHandle) -> Result<()> {
        let mut attempts = 0;
        while attempts < self.config.max_ready_attempts {
            if self.runtime.is_running(&handle.name).await? {
                tracing::debug!(container = %handle.name, "Container is ready");
                return Ok(());
            }
            attempts += 1;
            tracing::debug!(
                container = %handle.name,
                remaining = self.config.max_ready_attempts - attempts,
                "Waiting for container"
            );
            tokio::time::sleep(self.config.poll_interval).await;
        }

        Err(StampedeError::ReadinessTimeout {
            container: handle.name.clone(),
            attempts: self.config.max_ready_attempts,
        })
    }

    /// Force-remove the instance. Never invoked implicitly; a caller that
    /// wants to inspect a failed run post-mortem simply doesn't call it.
    pub async fn teardown(&self, handle: &RuntimeHandle) -> Result<()> {
        tracing::info!(container = %handle.name, "Removing container");
        let removed = self.runtime.remove(&handle.name).await?;
        if !removed.success {
            return Err(StampedeError::Teardown {
                stderr: removed.stderr,
            });
        }
        Ok(())
    }
}

pub(crate) async fn with_deadline<T>(
    stage: &'static str,
    deadline: Option<Duration>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| StampedeError::StageTimeout {
                stage,
                deadline_secs: limit.as_secs(),
            })?,
        None => fut.await,
    }
}
