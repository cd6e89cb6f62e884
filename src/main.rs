use anyhow::Context;
use tracing_subscriber::EnvFilter;

use trackademy_api::{config, database::Database, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trackademy_api=info,tower_http=info")),
        )
        .init();

    let config = config::config();
    config.validate().map_err(anyhow::Error::msg).context("invalid configuration")?;
    tracing::info!("Starting Trackademy API in {:?} mode", config.environment);

    let db = Database::connect(&config.database).await.context("failed to connect to database")?;
    if config.database.run_migrations {
        db.migrate().await.context("failed to apply migrations")?;
    }

    let app = trackademy_api::app(AppState::new(db.clone()));

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Trackademy API listening on http://{}", bind_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
