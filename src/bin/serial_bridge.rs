//! Arduino serial bridge: reads framed parking updates from a serial port
//! and relays them to the ingestion API.
//!
//! Startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Listing available serial ports as an operator aid
//! - Opening the configured port and streaming lines through the frame reader
//!
//! Each completed frame is handed to its own spawned delivery task, so a
//! pending retry never stalls the serial stream. Ctrl-C closes the port and
//! exits; in-flight retries are abandoned.
//!
//! # Environment Variables
//! - `INGEST_BASE_URL` (**required**) – base URL of the ingestion server
//! - `SERIAL_PORT` (optional) – device path (default: `/dev/ttyUSB0`)
//! - `SERIAL_BAUD` (optional) – baud rate (default: 9600)
//! - `MAX_RETRIES`, `RETRY_DELAY_MS`, `REQUEST_TIMEOUT_SECS` (optional) –
//!   delivery retry policy
use anyhow::Result;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_serial::{SerialPortBuilderExt, SerialPortType};
use tracing::{error, info, warn};

use parkride_telemetry::config::{self, BridgeConfig};
use parkride_telemetry::delivery::DeliveryClient;
use parkride_telemetry::framer::{FrameEvent, FrameReader};
use parkride_telemetry::init_tracing;

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_bridge_config()?;
    cfg.log_config();

    list_serial_ports();

    let Some(port) = open_serial_port(&cfg) else {
        // Diagnostics already logged; nothing to read from
        return Ok(());
    };

    let delivery = DeliveryClient::from_config(&cfg)?;

    info!("Serial port opened, listening for Arduino data");
    run_bridge(port, delivery).await;

    info!("Serial port closed, bridge shut down");
    Ok(())
}

// ---

/// Pump serial lines through the frame reader until EOF, an I/O error, or
/// Ctrl-C. Each parsed record gets its own delivery task.
async fn run_bridge(port: tokio_serial::SerialStream, delivery: DeliveryClient) {
    // ---
    let mut lines = BufReader::new(port).lines();
    let mut reader = FrameReader::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => handle_line(&mut reader, &delivery, &line),
                    Ok(None) => {
                        warn!("Serial stream ended (device disconnected?)");
                        break;
                    }
                    Err(e) => {
                        error!("Serial read error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, shutting down serial bridge");
                break;
            }
        }
    }
    // Dropping `lines` closes the port
}

fn handle_line(reader: &mut FrameReader, delivery: &DeliveryClient, line: &str) {
    // ---
    match reader.push_line(line) {
        Some(FrameEvent::Record(update)) => {
            info!(
                "Received parking frame: {} - {:?}/{:?} available",
                update.parking_lot_id.as_deref().unwrap_or("<unknown>"),
                update.available_slots,
                update.total_slots
            );
            let delivery = delivery.clone();
            tokio::spawn(async move {
                delivery.deliver(&update).await;
            });
        }
        Some(FrameEvent::DeviceLog(msg)) => {
            info!("[Arduino] {}", msg);
        }
        None => {}
    }
}

// ---

/// Open the configured serial port, logging operator hints on failure.
///
/// A failed open is reported, not fatal: the process exits cleanly so a
/// supervisor (or the operator) can fix the cabling and restart.
fn open_serial_port(cfg: &BridgeConfig) -> Option<tokio_serial::SerialStream> {
    // ---
    match tokio_serial::new(cfg.serial_port.as_str(), cfg.baud_rate).open_native_async() {
        Ok(port) => Some(port),
        Err(e) => {
            error!("Failed to open {}: {}", cfg.serial_port, e);
            warn!("Tips:");
            warn!("  - Check that the Arduino is connected via USB");
            warn!("  - Verify the port path (the Arduino IDE lists it)");
            warn!("  - Close the Arduino Serial Monitor if it is open");
            warn!("  - On Linux/Mac you may need permissions: sudo chmod 666 {}", cfg.serial_port);
            None
        }
    }
}

/// List available serial ports as an operator aid at startup.
fn list_serial_ports() {
    // ---
    match tokio_serial::available_ports() {
        Ok(ports) if ports.is_empty() => {
            warn!("No serial ports found; is the Arduino connected via USB?");
        }
        Ok(ports) => {
            info!("Available serial ports:");
            for p in ports {
                match p.port_type {
                    SerialPortType::UsbPort(usb) => {
                        info!(
                            "  {} (USB{})",
                            p.port_name,
                            usb.manufacturer
                                .map(|m| format!(", {}", m))
                                .unwrap_or_default()
                        );
                    }
                    _ => info!("  {}", p.port_name),
                }
            }
        }
        Err(e) => warn!("Could not enumerate serial ports: {}", e),
    }
}
