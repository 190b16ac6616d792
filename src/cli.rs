use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stampede")]
#[command(version)]
#[command(about = "Containerized load-test execution engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision a container for a repository, inject a k6 script, and run it
    Run {
        /// Path to an acquired repository (must contain a server/ directory)
        #[arg(short, long)]
        repo: PathBuf,

        /// Path to the generated k6 script
        #[arg(short, long)]
        script: PathBuf,

        /// The script's configured test duration in seconds
        #[arg(long, default_value = "10")]
        duration: u64,

        /// Remove the container after a successful run
        #[arg(long)]
        teardown: bool,

        /// Print the structured result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Parse a captured k6 console report into structured metrics
    Parse {
        /// Path to a file holding raw k6 output
        #[arg(short, long)]
        report: PathBuf,

        /// Test duration in seconds, for the throughput fallback
        #[arg(long, default_value = "10")]
        duration: u64,
    },

    /// Start the load-test HTTP API
    Serve {
        /// Port number
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Workspace root containing acquired repository checkouts
        #[arg(short, long)]
        workspace: PathBuf,

        /// Maximum concurrent load-test runs
        #[arg(long, default_value = "1")]
        capacity: usize,
    },
}
