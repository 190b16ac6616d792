use crate::acquire::WorkspaceCheckout;
use crate::pipeline::{LoadTestPipeline, PipelineConfig};
use crate::{Result, server};
use colored::Colorize;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

pub async fn execute_serve(port: u16, workspace: &Path, capacity: usize) -> Result<()> {
    println!("{}", "Starting load-test server...".bright_blue());
    println!("  Workspace: {}", workspace.display());
    println!("  Capacity: {}", capacity);
    println!("  Port: {}", port);
    println!();

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let pipeline = Arc::new(LoadTestPipeline::new(PipelineConfig {
        capacity,
        ..PipelineConfig::default()
    }));
    let repos = Arc::new(WorkspaceCheckout::new(workspace.to_path_buf()));

    server::start_server(addr, pipeline, repos).await?;

    Ok(())
}
