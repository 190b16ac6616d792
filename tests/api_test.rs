use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use stampede::acquire::WorkspaceCheckout;
use stampede::container::{ContainerConfig, ContainerRuntime, ExecOutput};
use stampede::pipeline::{LoadTestPipeline, PipelineConfig};
use stampede::server::{api::AppState, router};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Always-ready runtime that answers `k6 run` with a canned report.
struct StubRuntime {
    report: String,
}

impl ContainerRuntime for StubRuntime {
    async fn build_image(&self, _tag: &str, _context: &Path) -> stampede::Result<ExecOutput> {
        Ok(ok_output(""))
    }

    async fn start_detached(
        &self,
        _name: &str,
        _image: &str,
        _host_port: u16,
        _container_port: u16,
    ) -> stampede::Result<ExecOutput> {
        Ok(ok_output(""))
    }

    async fn is_running(&self, _name: &str) -> stampede::Result<bool> {
        Ok(true)
    }

    async fn exec(&self, _name: &str, cmd: &[&str]) -> stampede::Result<ExecOutput> {
        if cmd.first() == Some(&"k6") {
            return Ok(ok_output(&self.report));
        }
        Ok(ok_output(""))
    }

    async fn copy_in(&self, _src: &Path, _name: &str, _dest: &str) -> stampede::Result<ExecOutput> {
        Ok(ok_output(""))
    }

    async fn remove(&self, _name: &str) -> stampede::Result<ExecOutput> {
        Ok(ok_output(""))
    }
}

fn ok_output(stdout: &str) -> ExecOutput {
    ExecOutput {
        success: true,
        exit_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

fn test_state(workspace: &Path) -> AppState<StubRuntime> {
    let report =
        std::fs::read_to_string("tests/fixtures/k6-report.txt").expect("failed to read fixture");
    let config = PipelineConfig {
        container: ContainerConfig::default().with_poll_interval(Duration::from_millis(1)),
        ..PipelineConfig::default()
    };

    AppState {
        pipeline: Arc::new(LoadTestPipeline::with_runtime(StubRuntime { report }, config)),
        repos: Arc::new(WorkspaceCheckout::new(workspace.to_path_buf())),
    }
}

fn load_test_request(repo_url: &str) -> Request<Body> {
    let body = serde_json::json!({
        "repoUrl": repo_url,
        "testScript": "export default function () {}",
        "durationSecs": 10,
    });

    Request::builder()
        .method("POST")
        .uri("/api/load-tests")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_is_live() {
    let workspace = tempfile::tempdir().unwrap();
    let app = router(test_state(workspace.path()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn load_test_run_returns_structured_metrics() {
    let workspace = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(workspace.path().join("demo-api/server")).unwrap();
    let app = router(test_state(workspace.path()));

    let response = app
        .oneshot(load_test_request("https://github.com/acme/demo-api.git"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;

    assert_eq!(json["metrics"]["successRate"].as_f64().unwrap(), 98.5);
    assert_eq!(json["metrics"]["totalRequests"].as_u64().unwrap(), 200);
    assert_eq!(json["metrics"]["endpoints"][0]["method"], "GET");
    assert_eq!(json["metrics"]["endpoints"][0]["path"], "/users");
    assert_eq!(json["metrics"]["endpoints"][1]["successRate"].as_f64().unwrap(), 45.0);
}

#[tokio::test]
async fn unknown_repository_surfaces_as_server_error() {
    let workspace = tempfile::tempdir().unwrap();
    let app = router(test_state(workspace.path()));

    let response = app
        .oneshot(load_test_request("https://github.com/acme/missing.git"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.contains("Failed to acquire repository"));
}

#[tokio::test]
async fn live_runs_are_listed_after_a_run() {
    let workspace = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(workspace.path().join("demo-api/server")).unwrap();
    let state = test_state(workspace.path());
    let app = router(state.clone());

    let response = app
        .oneshot(load_test_request("https://github.com/acme/demo-api.git"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router(state)
        .oneshot(
            Request::builder()
                .uri("/api/runs")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = json_body(response).await;
    let runs = json["runs"].as_array().unwrap();
    assert_eq!(runs.len(), 1);
    assert!(
        runs[0]["container"]
            .as_str()
            .unwrap()
            .starts_with("stampede-run-")
    );
}

#[tokio::test]
async fn tearing_down_an_unknown_run_is_not_found() {
    let workspace = tempfile::tempdir().unwrap();
    let app = router(test_state(workspace.path()));

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/runs/00000000-0000-0000-0000-000000000000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
