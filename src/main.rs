use clap::Parser;
use tracing_subscriber::EnvFilter;

use dashboard_api_rust::cli::{self, Cli};
use dashboard_api_rust::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and friends are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    tracing::info!("Starting Dashboard API in {:?} mode ({:?} store)", config.environment, config.store);

    cli::run(Cli::parse(), config).await
}
