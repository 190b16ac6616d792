use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::acquire::{RepoProvider, WorkspaceCheckout};
use crate::container::ContainerRuntime;
use crate::error::StampedeError;
use crate::pipeline::LoadTestPipeline;
use crate::report::TestRun;

/// Shared application state
pub struct AppState<R: ContainerRuntime> {
    pub pipeline: Arc<LoadTestPipeline<R>>,
    pub repos: Arc<WorkspaceCheckout>,
}

impl<R: ContainerRuntime> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            repos: Arc::clone(&self.repos),
        }
    }
}

/// Request body for POST /api/load-tests
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTestRequest {
    pub repo_url: String,
    /// Generated k6 script; must already conform to the scripting contract
    /// (a default-exported function plus an options block).
    pub test_script: String,
    /// The script's configured duration, for the throughput fallback.
    #[serde(default)]
    pub duration_secs: Option<u64>,
}

/// Response for GET /api/runs
#[derive(Debug, Serialize)]
pub struct RunsResponse {
    pub runs: Vec<RunInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInfo {
    pub run_id: Uuid,
    pub container: String,
    pub host_port: u16,
}

/// GET /health - Liveness
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// POST /api/load-tests - Run the full pipeline and return the parsed result
pub async fn run_load_test<R: ContainerRuntime + 'static>(
    State(state): State<AppState<R>>,
    Json(request): Json<LoadTestRequest>,
) -> Result<Json<TestRun>, (StatusCode, String)> {
    let repo_path = state
        .repos
        .acquire(&request.repo_url)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let window = request.duration_secs.map(Duration::from_secs);
    let run = state
        .pipeline
        .execute(&repo_path, &request.test_script, window)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(run))
}

/// GET /api/runs - List live runs
pub async fn list_runs<R: ContainerRuntime + 'static>(
    State(state): State<AppState<R>>,
) -> Json<RunsResponse> {
    let runs = state
        .pipeline
        .live_runs()
        .await
        .into_iter()
        .map(|h| RunInfo {
            run_id: h.run_id,
            container: h.name,
            host_port: h.host_port,
        })
        .collect();

    Json(RunsResponse { runs })
}

/// DELETE /api/runs/:run_id - Tear down a live run's container
pub async fn teardown_run<R: ContainerRuntime + 'static>(
    State(state): State<AppState<R>>,
    Path(run_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    state.pipeline.teardown(run_id).await.map_err(|e| match e {
        StampedeError::RunNotFound { .. } => (StatusCode::NOT_FOUND, e.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    })?;

    Ok(StatusCode::NO_CONTENT)
}
