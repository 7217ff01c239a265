//! syncpad - shared real-time notepad server.

use clap::Parser;
use std::sync::Arc;
use syncpad::config::Config;
use syncpad::server::{self, state::AppState};
use syncpad::store::{DocumentStore, MemoryStore, SqliteStore};
use syncpad::sync::Engine;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("syncpad=info")),
        )
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config))
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store: Arc<dyn DocumentStore> = if config.ephemeral {
        tracing::info!("Running with an in-memory notepad, nothing will be saved");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(SqliteStore::open(&config.db_path())?)
    };

    // A notepad that exists but cannot be read stops startup here
    let engine = Arc::new(Engine::start(store, config.client_buffer)?);

    if !config.index.is_file() {
        tracing::warn!(path = ?config.index, "Index page not found, / will return 404");
    }

    let app = server::router(Arc::new(AppState::new(Arc::clone(&engine))), &config.index);
    server::run_server(config.bind, app, shutdown_signal()).await?;

    // Save whatever the last update was before exiting
    engine.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(?e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
