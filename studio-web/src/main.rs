use studio_core::observability::init_tracing;
use studio_web::config::get_configuration;
use studio_web::services::metrics::init_metrics;
use studio_web::startup::Application;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "studio-web",
        &settings.telemetry.log_level,
        settings.telemetry.otlp_endpoint.as_deref(),
    );
    init_metrics();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %settings.server.address(),
        supabase_url = %settings.supabase.base_url(),
        realtime = settings.studio.realtime,
        "Starting studio-web"
    );

    let app = Application::build(settings).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to build application");
        anyhow::anyhow!("Application build error: {}", e)
    })?;

    app.run_until_stopped().await?;
    Ok(())
}
