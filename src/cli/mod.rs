use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::app::{router, AppState};
use crate::config::{AppConfig, StoreBackend};
use crate::database::{DatabaseManager, MemoryStore, PgStore, Store};
use crate::events::{AuditLogObserver, EventBus};
use crate::services::ComponentService;

#[derive(Parser)]
#[command(name = "dashboard-api")]
#[command(about = "Dashboard component configuration API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Listen port, overrides configuration")]
        port: Option<u16>,
    },

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => serve(config, port.unwrap_or(config.api.port)).await,
        Commands::Migrate => {
            let manager = DatabaseManager::connect(&config.database).await?;
            manager.migrate().await?;
            manager.close().await;
            Ok(())
        }
    }
}

async fn serve(config: &AppConfig, port: u16) -> anyhow::Result<()> {
    let store = build_store(config).await?;
    let events = EventBus::new().with_observer(Arc::new(AuditLogObserver));
    let state = AppState::new(ComponentService::new(store, events));
    let app = router(state, config);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Dashboard API listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    match config.store {
        StoreBackend::Postgres => {
            let manager = DatabaseManager::connect(&config.database).await?;
            Ok(Arc::new(PgStore::from_manager(&manager)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
