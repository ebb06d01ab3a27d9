use school_portal::config::get_configuration;
use school_portal::services::init_metrics;
use school_portal::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "school-portal",
        &settings.telemetry.log_level,
        settings.telemetry.otlp_endpoint.as_deref(),
    );
    init_metrics();

    let application = Application::build(settings).await?;
    application.run_until_stopped().await?;

    Ok(())
}
