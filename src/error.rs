use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Which provisioning step exited non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStage {
    Build,
    Start,
}

impl std::fmt::Display for ProvisionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisionStage::Build => write!(f, "image build"),
            ProvisionStage::Start => write!(f, "container start"),
        }
    }
}

/// Failures while placing the test script inside the runtime.
///
/// Callers branch on the variant: a host-side write failure means the
/// repository checkout is unusable, while the container-side variants carry
/// the tool's stderr.
#[derive(Error, Debug)]
pub enum InjectionError {
    #[error("Failed to write test script to {path}: {source}")]
    HostWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create script directory in container: {stderr}")]
    CreateDir { stderr: String },

    #[error("Failed to copy test script into container: {stderr}")]
    Copy { stderr: String },
}

#[derive(Error, Debug)]
pub enum StampedeError {
    #[error("Container {stage} failed: {stderr}")]
    Provision { stage: ProvisionStage, stderr: String },

    #[error("Container '{container}' did not become ready in time ({attempts} attempts)")]
    ReadinessTimeout { container: String, attempts: u32 },

    #[error(transparent)]
    Injection(#[from] InjectionError),

    #[error("Load test failed (exit code {exit_code}): {stderr}")]
    Execution { exit_code: i32, stderr: String },

    #[error("Stage '{stage}' exceeded its deadline of {deadline_secs}s")]
    StageTimeout {
        stage: &'static str,
        deadline_secs: u64,
    },

    #[error("Failed to acquire repository '{url}': {reason}")]
    RepoAcquisition { url: String, reason: String },

    #[error("Failed to remove container: {stderr}")]
    Teardown { stderr: String },

    #[error("Load-test capacity is unavailable")]
    CapacityExhausted,

    #[error("No live run with id {run_id}")]
    RunNotFound { run_id: Uuid },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StampedeError>;
