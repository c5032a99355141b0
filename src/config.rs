//! Configuration loaders for the `parkride-telemetry` binaries.
//!
//! This module centralizes all runtime configuration values and their
//! defaults, loading from environment variables (with optional `.env` file
//! support provided by the caller). The server and the serial bridge are
//! separate processes with separate needs, so each gets its own config
//! struct and loader; neither requires the other's variables to be set.
use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Parse an optional string environment variable with a default value.
macro_rules! parse_env_string {
    ($var_name:expr, $default:expr) => {
        env::var($var_name).unwrap_or_else(|_| $default.to_string())
    };
}

// ---

/// Configuration for the ingestion API server.
///
/// All fields are immutable after loading, ensuring a consistent
/// configuration snapshot for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// TCP port the HTTP server binds on (all interfaces).
    pub http_port: u32,
}

/// Load server configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `HTTP_PORT` – listen port (default: 8080)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_server_config() -> Result<ServerConfig> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let http_port = parse_env_u32!("HTTP_PORT", 8080);

    Ok(ServerConfig {
        db_url,
        db_pool_max,
        http_port,
    })
}

impl ServerConfig {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the database password while showing all values that were loaded.
    pub fn log_config(&self) {
        // ---
        // Mask the password in the database URL for security
        let masked_db_url = if let Some(at_pos) = self.db_url.rfind('@') {
            if let Some(colon_pos) = self.db_url[..at_pos].rfind(':') {
                format!(
                    "{}:****{}",
                    &self.db_url[..colon_pos],
                    &self.db_url[at_pos..]
                )
            } else {
                self.db_url.clone()
            }
        } else {
            self.db_url.clone()
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL : {}", masked_db_url);
        tracing::info!("  DB_POOL_MAX  : {}", self.db_pool_max);
        tracing::info!("  HTTP_PORT    : {}", self.http_port);
    }
}

// ---

/// Configuration for the serial bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    // ---
    /// Serial device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub serial_port: String,

    /// Serial baud rate.
    pub baud_rate: u32,

    /// Base URL of the ingestion API server.
    pub server_url: String,

    /// Path of the ingestion endpoint on the server.
    pub endpoint_path: String,

    /// Per-request timeout for deliveries.
    pub request_timeout: Duration,

    /// Maximum number of retries after the initial send.
    pub max_retries: u32,

    /// Fixed delay between retry attempts.
    pub retry_delay: Duration,
}

/// Load bridge configuration from environment variables with defaults.
///
/// Required:
/// - `INGEST_BASE_URL` – base URL of the ingestion API server
///
/// Optional:
/// - `SERIAL_PORT` – device path (default: `/dev/ttyUSB0`)
/// - `SERIAL_BAUD` – baud rate (default: 9600)
/// - `INGEST_ENDPOINT` – endpoint path (default: `/api/arduino/parking`)
/// - `REQUEST_TIMEOUT_SECS` – per-request timeout (default: 5)
/// - `MAX_RETRIES` – retries after the first send (default: 3)
/// - `RETRY_DELAY_MS` – fixed delay between retries (default: 2000)
pub fn load_bridge_config() -> Result<BridgeConfig> {
    // ---
    let server_url = require_env!("INGEST_BASE_URL");
    let serial_port = parse_env_string!("SERIAL_PORT", "/dev/ttyUSB0");
    let baud_rate = parse_env_u32!("SERIAL_BAUD", 9600);
    let endpoint_path = parse_env_string!("INGEST_ENDPOINT", "/api/arduino/parking");
    let request_timeout = Duration::from_secs(parse_env_u32!("REQUEST_TIMEOUT_SECS", 5) as u64);
    let max_retries = parse_env_u32!("MAX_RETRIES", 3);
    let retry_delay = Duration::from_millis(parse_env_u32!("RETRY_DELAY_MS", 2000) as u64);

    Ok(BridgeConfig {
        serial_port,
        baud_rate,
        server_url,
        endpoint_path,
        request_timeout,
        max_retries,
        retry_delay,
    })
}

impl BridgeConfig {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  SERIAL_PORT          : {}", self.serial_port);
        tracing::info!("  SERIAL_BAUD          : {}", self.baud_rate);
        tracing::info!("  INGEST_BASE_URL      : {}", self.server_url);
        tracing::info!("  INGEST_ENDPOINT      : {}", self.endpoint_path);
        tracing::info!("  REQUEST_TIMEOUT_SECS : {}", self.request_timeout.as_secs());
        tracing::info!("  MAX_RETRIES          : {}", self.max_retries);
        tracing::info!("  RETRY_DELAY_MS       : {}", self.retry_delay.as_millis());
    }

    /// Full URL of the ingestion endpoint.
    pub fn ingest_url(&self) -> String {
        format!("{}{}", self.server_url, self.endpoint_path)
    }
}
