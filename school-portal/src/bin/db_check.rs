//! Connectivity smoke test: connect to Postgres, run `SELECT 1`, report, exit.

use school_portal::config::get_configuration;
use secrecy::ExposeSecret;
use service_core::observability::init_tracing;
use sqlx::postgres::PgPoolOptions;
use std::process::ExitCode;
use std::time::Duration;

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match get_configuration() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to read configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing("db-check", &settings.telemetry.log_level, None);

    let Some(url) = settings.database.url.as_ref() else {
        tracing::error!("database.url is not configured (set APP_DATABASE__URL)");
        return ExitCode::FAILURE;
    };

    match check_connection(url.expose_secret()).await {
        Ok(()) => {
            tracing::info!("Database connection OK");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Database connection failed");
            ExitCode::FAILURE
        }
    }
}

async fn check_connection(url: &str) -> Result<(), sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(url)
        .await?;

    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await?;
    tracing::info!(result = one, "Test query succeeded");

    pool.close().await;
    Ok(())
}
