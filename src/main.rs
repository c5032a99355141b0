//! Application entry point for the `parkride-telemetry` ingestion server.
//!
//! This binary orchestrates the full startup sequence for the parking
//! telemetry API, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Establishing a PostgreSQL connection pool
//! - Creating the database schema if it does not exist
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required**) – PostgreSQL connection string
//! - `DB_POOL_MAX` (optional) – maximum number of DB connections (default: 5)
//! - `HTTP_PORT` (optional) – listen port (default: 8080)
//! - `PARKRIDE_LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `PARKRIDE_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! Schema setup is delegated to `schema`, configuration parsing to `config`,
//! and route registration to `routes` (EMBP).
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;

use anyhow::Result;

use parkride_telemetry::store::PgStore;
use parkride_telemetry::{config, init_tracing, routes, schema};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_server_config()?;
    cfg.log_config();

    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(&cfg.db_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database '{}': {}", cfg.db_url, e))?;

    tracing::info!("Successfully connected to database");

    schema::create_schema(&pool).await?;

    // Build app from routes gateway (EMBP)
    let store = Arc::new(PgStore::new(pool));
    let app: Router = routes::router(store);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.http_port as u16));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
