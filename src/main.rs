use clap::Parser;
use stampede::{
    Result,
    cli::{Cli, Commands},
    commands, telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let _guard = telemetry::init_telemetry()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            repo,
            script,
            duration,
            teardown,
            json,
        } => {
            commands::execute_run(&repo, &script, duration, teardown, json).await?;
        }
        Commands::Parse { report, duration } => {
            commands::execute_parse(&report, duration)?;
        }
        Commands::Serve {
            port,
            workspace,
            capacity,
        } => {
            commands::execute_serve(port, &workspace, capacity).await?;
        }
    }

    Ok(())
}
