pub mod api;

use crate::acquire::WorkspaceCheckout;
use crate::container::{ContainerRuntime, Docker};
use crate::pipeline::LoadTestPipeline;
use axum::{
    Router,
    routing::{delete, get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the API router over any container runtime.
pub fn router<R: ContainerRuntime + 'static>(state: api::AppState<R>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/load-tests", post(api::run_load_test::<R>))
        .route("/api/runs", get(api::list_runs::<R>))
        .route("/api/runs/{run_id}", delete(api::teardown_run::<R>))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the load-test API until the process is stopped.
pub async fn start_server(
    addr: SocketAddr,
    pipeline: Arc<LoadTestPipeline<Docker>>,
    repos: Arc<WorkspaceCheckout>,
) -> crate::Result<()> {
    let app = router(api::AppState { pipeline, repos });

    tracing::info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
