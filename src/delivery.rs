//! HTTP delivery of parsed parking updates to the ingestion endpoint.
//!
//! Best-effort, at-most-N-attempts policy: a transient failure is retried a
//! bounded number of times with a fixed delay, then the update is dropped and
//! the loss logged. No backlog is kept. Each delivery runs as its own spawned
//! task holding its own record and attempt counter, so a pending retry never
//! blocks the serial reader and deliveries for successive frames may overlap.

use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::config::BridgeConfig;
use crate::models::RawParkingUpdate;

// ---

/// Final fate of one parking update handed to [`DeliveryClient::deliver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Server accepted and stored the update.
    Delivered,
    /// Server answered but refused the data; retrying cannot help.
    Rejected,
    /// All attempts failed with transient errors; update lost.
    Dropped,
}

/// Application-level envelope the ingestion API wraps every response in.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Relays parking updates to the ingestion endpoint with bounded retries.
///
/// Cheap to clone (shares the underlying connection pool); clone one per
/// spawned delivery task.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    client: reqwest::Client,
    url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl DeliveryClient {
    // ---

    /// Build a client posting to `url` with the given timeout and retry policy.
    pub fn new(
        url: String,
        request_timeout: Duration,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Result<Self> {
        // ---
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            client,
            url,
            max_retries,
            retry_delay,
        })
    }

    pub fn from_config(cfg: &BridgeConfig) -> Result<Self> {
        // ---
        Self::new(
            cfg.ingest_url(),
            cfg.request_timeout,
            cfg.max_retries,
            cfg.retry_delay,
        )
    }

    /// Deliver one update, retrying transient failures up to the configured
    /// limit with a fixed delay between attempts.
    ///
    /// Transient means a transport error (refused, timeout, DNS) or a 5xx
    /// response. A 2xx with `success: false` or any 4xx is a data problem the
    /// server has already seen; those are terminal and never retried.
    pub async fn deliver(&self, update: &RawParkingUpdate) -> DeliveryOutcome {
        // ---
        let lot = update.parking_lot_id.as_deref().unwrap_or("<unknown>");

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                info!("Retrying {} ({}/{})", lot, attempt, self.max_retries);
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self.client.post(&self.url).json(update).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    return match resp.json::<ApiEnvelope>().await {
                        Ok(body) if body.success => {
                            info!(
                                "Delivered update for {}: {}",
                                lot,
                                body.message.as_deref().unwrap_or("ok")
                            );
                            DeliveryOutcome::Delivered
                        }
                        Ok(body) => {
                            warn!(
                                "Server refused update for {}: {}",
                                lot,
                                body.message.as_deref().unwrap_or("no message")
                            );
                            DeliveryOutcome::Rejected
                        }
                        Err(e) => {
                            warn!("Unreadable server response for {}: {}", lot, e);
                            DeliveryOutcome::Rejected
                        }
                    };
                }
                Ok(resp) if resp.status().is_client_error() => {
                    let status = resp.status();
                    let message = resp
                        .json::<ApiEnvelope>()
                        .await
                        .ok()
                        .and_then(|b| b.message)
                        .unwrap_or_default();
                    warn!("Server rejected update for {} ({}): {}", lot, status, message);
                    return DeliveryOutcome::Rejected;
                }
                Ok(resp) => {
                    // 5xx: storage backend trouble, worth another attempt
                    error!(
                        "Server error delivering {} (attempt {}): {}",
                        lot,
                        attempt + 1,
                        resp.status()
                    );
                }
                Err(e) if e.is_connect() => {
                    error!(
                        "Cannot reach server at {} (attempt {}): {}",
                        self.url,
                        attempt + 1,
                        e
                    );
                }
                Err(e) if e.is_timeout() => {
                    error!("Request timed out for {} (attempt {})", lot, attempt + 1);
                }
                Err(e) => {
                    error!("Failed to send {} (attempt {}): {}", lot, attempt + 1, e);
                }
            }
        }

        warn!(
            "Max retries reached for {}; dropping this update",
            lot
        );
        DeliveryOutcome::Dropped
    }
}
