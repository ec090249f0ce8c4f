use anyhow::Context;
use tracing_subscriber::EnvFilter;

use dugsi_api::{app, config::AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dugsi_api=info,tower_http=info")),
        )
        .init();

    let config = dugsi_api::config::config().clone();
    tracing::info!("Starting Dugsi API in {:?} mode", config.environment);

    let port = config.api.port;
    let state = build_state(config).await?;
    let app = app(state.clone());

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Dugsi API listening on http://{}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(database) = &state.database {
        database.close().await;
    }
    Ok(())
}

async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    if config.database.url.is_empty() {
        if dugsi_api::is_production!() {
            anyhow::bail!("DATABASE_URL is required in production");
        }
        tracing::warn!("DATABASE_URL not set; using in-memory stores");
        return Ok(AppState::in_memory(config));
    }

    AppState::connect(config).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
