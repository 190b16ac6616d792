//! k6 executor
//!
//! Invokes k6 inside the running instance against the injected script and
//! captures its console report.

use super::RawReport;
use crate::container::{
    CONTAINER_SCRIPT_DIR, ContainerRuntime, LifecycleManager, RuntimeHandle, TEST_SCRIPT_NAME,
    with_deadline,
};
use crate::error::{Result, StampedeError};

/// Runs the injected k6 script inside a provisioned container.
pub struct K6Executor<'m, R: ContainerRuntime> {
    lifecycle: &'m LifecycleManager<R>,
}

impl<'m, R: ContainerRuntime> K6Executor<'m, R> {
    pub fn new(lifecycle: &'m LifecycleManager<R>) -> Self {
        Self { lifecycle }
    }

    /// Execute the load test and return the full captured stdout verbatim.
    ///
    /// A non-zero exit is terminal for the pipeline invocation; there is no
    /// retry. No preprocessing happens at this layer.
    pub async fn run(&self, handle: &RuntimeHandle) -> Result<RawReport> {
        self.lifecycle.await_ready(handle).await?;

        let script = format!("{}/{}", CONTAINER_SCRIPT_DIR, TEST_SCRIPT_NAME);
        tracing::info!(container = %handle.name, script = %script, "Running k6 load test");

        let output = with_deadline(
            "execute",
            self.lifecycle.config().exec_deadline,
            self.lifecycle
                .runtime()
                .exec(&handle.name, &["k6", "run", &script]),
        )
        .await?;

        if !output.success {
            return Err(StampedeError::Execution {
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        tracing::info!(container = %handle.name, "Load test completed");
        Ok(RawReport::new(output.stdout))
    }
}
