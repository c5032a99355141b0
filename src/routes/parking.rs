//! Arduino parking ingestion endpoint.
//!
//! `POST /api/arduino/parking` receives one parking update from the serial
//! bridge, validates required fields, normalizes against the static facility
//! table, and upserts the result keyed by lot id. Posting an identical body
//! twice leaves the store unchanged, so the bridge is free to redeliver after
//! an ambiguous failure. `GET` on the same path serves the stored records
//! back to the map frontend.

use std::sync::Arc;

use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::models::{ParkingStatus, RawParkingUpdate};
use crate::store::Store;

// ---

pub fn router() -> Router<Arc<dyn Store>> {
    // ---
    Router::new().route(
        "/api/arduino/parking",
        get(get_parking).post(post_parking),
    )
}

/// Envelope every response from this endpoint is wrapped in.
#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    // ---
    fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            error: None,
        }
    }

    fn fail(message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            error,
        }
    }
}

// ---

async fn post_parking(
    State(store): State<Arc<dyn Store>>,
    Json(update): Json<RawParkingUpdate>,
) -> impl IntoResponse {
    // ---
    let missing = update.missing_fields();
    if !missing.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<ParkingStatus>::fail(
                format!("Missing required fields: {}", missing.join(", ")),
                None,
            )),
        )
            .into_response();
    }

    let status = update.normalize(Utc::now());

    if let Err(e) = store.upsert(&status).await {
        error!("Failed to store update for {}: {:#}", status.parking_lot_id, e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<ParkingStatus>::fail(
                "Failed to process parking update",
                Some(e.to_string()),
            )),
        )
            .into_response();
    }

    info!(
        "Parking update stored: {} - {}/{} available",
        status.parking_lot_id, status.available_slots, status.total_slots
    );

    (
        StatusCode::OK,
        Json(ApiResponse::ok(
            "Parking update received and stored successfully",
            status,
        )),
    )
        .into_response()
}

// ---

/// Query parameters for `GET /api/arduino/parking`.
#[derive(Debug, Deserialize)]
struct ParkingQuery {
    #[serde(rename = "parkingLotId")]
    parking_lot_id: Option<String>,
}

/// Serve one lot's record when `parkingLotId` is given, all records otherwise.
async fn get_parking(
    Query(params): Query<ParkingQuery>,
    State(store): State<Arc<dyn Store>>,
) -> impl IntoResponse {
    // ---
    match params.parking_lot_id {
        Some(lot_id) => match store.get(&lot_id).await {
            Ok(Some(status)) => {
                (StatusCode::OK, Json(ApiResponse::ok("ok", status))).into_response()
            }
            Ok(None) => (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<ParkingStatus>::fail(
                    format!("No parking data for {}", lot_id),
                    None,
                )),
            )
                .into_response(),
            Err(e) => storage_error(&e),
        },
        None => match store.list().await {
            Ok(all) => (StatusCode::OK, Json(ApiResponse::ok("ok", all))).into_response(),
            Err(e) => storage_error(&e),
        },
    }
}

fn storage_error(e: &anyhow::Error) -> axum::response::Response {
    // ---
    error!("Failed to read parking data: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<ParkingStatus>::fail(
            "Failed to fetch parking data",
            Some(e.to_string()),
        )),
    )
        .into_response()
}
