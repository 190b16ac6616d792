//! Run command implementation
//!
//! Drives the whole pipeline against a local checkout and prints the result.

use crate::error::Result;
use crate::pipeline::{LoadTestPipeline, PipelineConfig};
use crate::report::TestRun;
use colored::Colorize;
use std::path::Path;
use std::time::Duration;

pub async fn execute_run(
    repo: &Path,
    script_path: &Path,
    duration_secs: u64,
    teardown: bool,
    json: bool,
) -> Result<()> {
    let script = tokio::fs::read_to_string(script_path).await?;
    println!(
        "{} Loaded test script: {}",
        "✓".green(),
        script_path.display()
    );

    let config = PipelineConfig {
        teardown_on_success: teardown,
        ..PipelineConfig::default()
    };
    let pipeline = LoadTestPipeline::new(config);

    println!(
        "{} Provisioning container for {}",
        "→".blue(),
        repo.display()
    );

    let run = pipeline
        .execute(repo, &script, Some(Duration::from_secs(duration_secs)))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        print_summary(&run);
    }

    Ok(())
}

fn print_summary(run: &TestRun) {
    let m = &run.metrics;

    println!("\n{} Load test completed", "✓".green());
    println!("\n{}", "Metrics Summary:".bold());
    println!("  HTTP Requests: {}", m.total_requests);
    println!("  Iterations: {}", m.iterations);
    println!(
        "  Virtual Users: {} (max {})",
        m.virtual_users, m.max_virtual_users
    );
    println!("  Success Rate: {:.2}%", m.success_rate);
    println!("  Requests/s: {:.2}", m.requests_per_second);
    println!(
        "  Duration: avg {:.2}ms, med {:.2}ms, p95 {:.2}ms, max {:.2}ms",
        m.request_duration.avg, m.request_duration.med, m.request_duration.p95, m.request_duration.max
    );

    if !m.endpoints.is_empty() {
        println!("\n{}", "Endpoints:".bold());
        for endpoint in &m.endpoints {
            let glyph = if endpoint.success {
                "✓".green()
            } else {
                "✗".red()
            };
            println!(
                "  {} {} {} ({:.0}%)",
                glyph, endpoint.method, endpoint.path, endpoint.success_rate
            );
        }
    }
}
