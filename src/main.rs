//! Panel Ledger - Main Application Entry Point
//!
//! This is the REST API server for a service-reselling panel: user balances,
//! order placement, operator status management, and dashboard statistics.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Persistence**: an abstract document store; PostgreSQL (sqlx) in
//!   production, in-memory for local development
//! - **Consistency**: balance mutations commit behind document revision
//!   guards, so concurrent requests cannot race past the balance check
//! - **Format**: JSON requests/responses with a success/error envelope
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Connect the configured store backend (and migrate, for Postgres)
//! 3. Build the HTTP router with shared service state
//! 4. Start the server on the configured port

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use panel_ledger::{
    config::{Config, StoreBackend},
    handlers::{self, AppState},
    store::{MemoryStore, PgStore, Store},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Connect the store backend
    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres backend")?;
            let store = PgStore::connect(database_url).await?;
            store.migrate().await?;
            tracing::info!("Postgres store connected and migrated");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; nothing will be persisted");
            Arc::new(MemoryStore::new())
        }
    };

    // Build the router with shared service state
    let app = handlers::router(AppState::new(store));

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    // This blocks forever, handling requests concurrently with tokio
    axum::serve(listener, app).await?;

    Ok(())
}
