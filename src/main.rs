//! The server for the crescendo booking marketplace

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crescendo::config::Config;
use crescendo::db::connect_to_db;
use crescendo::{app, AppState};

const DEFAULT_LOG_FILTER: &str = "crescendo=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Config::from_env()?;
    let pool = connect_to_db(&config).await?;
    tracing::info!(database = %config.database_url, "connected to database");

    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;
    tracing::info!(address = %config.bind_address, upload_dir = %config.upload_dir.display(), "listening");

    axum::serve(listener, app(AppState::new(pool, config)))
        .await
        .context("Server failed")
}
