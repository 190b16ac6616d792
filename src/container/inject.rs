//! Script injection
//!
//! Materializes a generated test script on the host, then copies it into the
//! running instance at the fixed path the executor expects.

use super::{CONTAINER_SCRIPT_DIR, ContainerRuntime, LifecycleManager, RuntimeHandle, TEST_SCRIPT_NAME};
use crate::error::{InjectionError, Result};
use std::path::Path;

/// Copies a generated script into a provisioned runtime.
pub struct ScriptInjector<'m, R: ContainerRuntime> {
    lifecycle: &'m LifecycleManager<R>,
}

impl<'m, R: ContainerRuntime> ScriptInjector<'m, R> {
    pub fn new(lifecycle: &'m LifecycleManager<R>) -> Self {
        Self { lifecycle }
    }

    /// Write the script under `<repo>/server/load-test/` and copy it to
    /// `/app/load-test/` inside the instance.
    ///
    /// The destination directory is created on both sides before anything is
    /// copied, and the readiness poll runs again first; the copy must not
    /// race a filesystem that does not exist yet.
    pub async fn inject(
        &self,
        repo_path: &Path,
        script_text: &str,
        handle: &RuntimeHandle,
    ) -> Result<()> {
        let script_dir = repo_path.join("server").join("load-test");
        tokio::fs::create_dir_all(&script_dir)
            .await
            .map_err(|source| InjectionError::HostWrite {
                path: script_dir.clone(),
                source,
            })?;

        let script_path = script_dir.join(TEST_SCRIPT_NAME);
        tracing::info!(path = %script_path.display(), "Writing test script");
        tokio::fs::write(&script_path, script_text)
            .await
            .map_err(|source| InjectionError::HostWrite {
                path: script_path.clone(),
                source,
            })?;

        self.lifecycle.await_ready(handle).await?;

        let mkdir = self
            .lifecycle
            .runtime()
            .exec(&handle.name, &["mkdir", "-p", CONTAINER_SCRIPT_DIR])
            .await?;
        if !mkdir.success {
            return Err(InjectionError::CreateDir {
                stderr: mkdir.stderr,
            }
            .into());
        }

        tracing::info!(container = %handle.name, "Copying test script into container");
        let dest = format!("{}/{}", CONTAINER_SCRIPT_DIR, TEST_SCRIPT_NAME);
        let copy = self
            .lifecycle
            .runtime()
            .copy_in(&script_path, &handle.name, &dest)
            .await?;
        if !copy.success {
            return Err(InjectionError::Copy { stderr: copy.stderr }.into());
        }

        Ok(())
    }
}
