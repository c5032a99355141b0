//! Library crate for the `parkride-telemetry` pipeline.
//!
//! Two binaries share this library:
//! - `parkride-telemetry` – the ingestion API server (Axum + PostgreSQL)
//! - `serial-bridge` – the Arduino-side serial-to-HTTP bridge
//!
//! The pipeline moves one record type end to end:
//! Device → [`framer::FrameReader`] → [`delivery::DeliveryClient`] →
//! `POST /api/arduino/parking` → [`store::Store`].
//!
//! This crate follows the Explicit Module Boundary Pattern (EMBP): each
//! concern lives in its own module, and `routes/mod.rs` is the single
//! gateway that assembles the HTTP surface.
use std::env;
use std::io::IsTerminal;

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

pub mod config;
pub mod delivery;
pub mod framer;
pub mod locations;
pub mod models;
pub mod routes;
pub mod schema;
pub mod store;

pub use config::{BridgeConfig, ServerConfig};
pub use models::{ParkingStatus, RawParkingUpdate};

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// Configures [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `PARKRIDE_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by `RUST_LOG`, falling back to `PARKRIDE_LOG_LEVEL`
///
/// Call once at process startup, before any logging or tracing macros are
/// invoked. Installs the subscriber globally for the lifetime of the process.
pub fn init_tracing() {
    // ---
    let span_events = match env::var("PARKRIDE_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to PARKRIDE_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("PARKRIDE_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn,hyper=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
