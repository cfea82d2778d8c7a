use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ecoswap_api::config::{self, AppConfig};
use ecoswap_api::database::{manager, MemoryStore, PgStore};
use ecoswap_api::{router, AppState};

#[derive(Parser)]
#[command(name = "ecoswap-api")]
#[command(about = "Ecoswap marketplace API server")]
#[command(version)]
struct Args {
    /// Listen port (overrides ECOSWAP_API_PORT / PORT)
    #[arg(long, env = "ECOSWAP_API_PORT")]
    port: Option<u16>,

    /// Keep all data in process memory instead of PostgreSQL
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    config::load_dotenv(None);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ecoswap_api=debug")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(port) = args.port {
        config.api.port = port;
    }
    tracing::info!("Starting Ecoswap API in {:?} mode", config.environment);

    let state = build_state(config, args.memory).await?;
    let port = state.config.api.port;
    let app = router(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Ecoswap API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// PostgreSQL when a URL is configured, otherwise the in-memory store. Only
/// development may run without a database.
async fn build_state(config: AppConfig, memory: bool) -> anyhow::Result<AppState> {
    if memory || config.database.url.is_none() {
        if !memory && !config.is_development() {
            anyhow::bail!("DATABASE_URL must be set in {:?} mode", config.environment);
        }
        tracing::warn!("Using the in-memory store, data is lost on shutdown");

        let store = Arc::new(MemoryStore::new());
        return Ok(AppState::new(config, store.clone(), store));
    }

    let pool = manager::connect(&config.database).await?;
    manager::ensure_schema(&pool).await?;

    let store = Arc::new(PgStore::new(pool));
    Ok(AppState::new(config, store.clone(), store))
}
