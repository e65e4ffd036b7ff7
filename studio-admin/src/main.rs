use chrono::Utc;
use clap::Parser;
use studio_admin::commands::{run, Cli};
use studio_admin::config::ScriptSettings;
use studio_core::observability::init_cli_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_cli_tracing(&cli.log_level);

    let settings = ScriptSettings::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to read configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    let report = run(cli.command, &settings, Utc::now()).await.map_err(|e| {
        tracing::error!(command = ?cli.command, error = %e, "Command failed");
        e
    })?;

    println!("{report}");
    Ok(())
}
