//! End-to-end tests for the ingestion API, driven over real HTTP against an
//! in-process server backed by the in-memory store.

use std::sync::Arc;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use parkride_telemetry::routes;
use parkride_telemetry::store::MemoryStore;

// ---

/// Spawn the full router on an ephemeral port; returns the base URL.
async fn spawn_api() -> Result<String> {
    // ---
    let store = Arc::new(MemoryStore::new());
    let app = routes::router(store);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(format!("http://{}", addr))
}

fn sample_update() -> Value {
    // ---
    json!({
        "parkingLotId": "SAB_Mall_Parking",
        "totalSlots": 100,
        "availableSlots": 30
    })
}

// ---

#[tokio::test]
async fn post_derives_and_normalizes() -> Result<()> {
    // ---
    let base = spawn_api().await?;
    let client = Client::new();

    let resp = client
        .post(format!("{}/api/arduino/parking", base))
        .json(&sample_update())
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["success"], true);

    let data = &body["data"];
    assert_eq!(data["occupiedSlots"], 70);
    assert_eq!(data["occupancyRate"], 70.0);
    // Known lot resolves from the static table
    assert_eq!(data["name"], "SAB Mall Parking");
    assert_eq!(data["latitude"], 28.567582);
    assert_eq!(data["longitude"], 77.322673);
    assert_eq!(data["hourlyRate"], 30);
    assert_eq!(data["sensorConnected"], true);

    Ok(())
}

#[tokio::test]
async fn posting_twice_is_idempotent() -> Result<()> {
    // ---
    let base = spawn_api().await?;
    let client = Client::new();
    let url = format!("{}/api/arduino/parking", base);

    client.post(&url).json(&sample_update()).send().await?;
    client.post(&url).json(&sample_update()).send().await?;

    let body: Value = client.get(&url).send().await?.json().await?;
    let all = body["data"].as_array().unwrap();
    assert_eq!(all.len(), 1, "redelivery must not create a second record");
    assert_eq!(all[0]["availableSlots"], 30);

    // A later update for the same lot wins outright
    let mut update = sample_update();
    update["availableSlots"] = json!(12);
    client.post(&url).json(&update).send().await?;

    let body: Value = client
        .get(format!("{}?parkingLotId=SAB_Mall_Parking", url))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"]["availableSlots"], 12);
    assert_eq!(body["data"]["occupiedSlots"], 88);

    Ok(())
}

#[tokio::test]
async fn updates_for_different_lots_are_independent() -> Result<()> {
    // ---
    let base = spawn_api().await?;
    let client = Client::new();
    let url = format!("{}/api/arduino/parking", base);

    client.post(&url).json(&sample_update()).send().await?;
    client
        .post(&url)
        .json(&json!({
            "parkingLotId": "Noida_City_Centre_Metro_Vehicle_Parking",
            "totalSlots": 200,
            "availableSlots": 150
        }))
        .send()
        .await?;

    let body: Value = client.get(&url).send().await?.json().await?;
    let all = body["data"].as_array().unwrap();
    assert_eq!(all.len(), 2);

    // SAB lot untouched by the metro lot's update
    let sab = all
        .iter()
        .find(|r| r["parkingLotId"] == "SAB_Mall_Parking")
        .unwrap();
    assert_eq!(sab["availableSlots"], 30);

    Ok(())
}

#[tokio::test]
async fn missing_fields_rejected_without_write() -> Result<()> {
    // ---
    let base = spawn_api().await?;
    let client = Client::new();
    let url = format!("{}/api/arduino/parking", base);

    let resp = client
        .post(&url)
        .json(&json!({ "parkingLotId": "SAB_Mall_Parking", "totalSlots": 100 }))
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await?;
    assert_eq!(body["success"], false);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("availableSlots"),
        "400 must name the missing field, got: {}",
        body["message"]
    );

    // Nothing was stored
    let body: Value = client.get(&url).send().await?.json().await?;
    assert!(body["data"].as_array().unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn unknown_lot_falls_back_to_defaults() -> Result<()> {
    // ---
    let base = spawn_api().await?;
    let client = Client::new();
    let url = format!("{}/api/arduino/parking", base);

    let resp = client
        .post(&url)
        .json(&json!({
            "parkingLotId": "Greater_Noida_Lot_7",
            "name": "Pari Chowk Parking",
            "totalSlots": 40,
            "availableSlots": 10
        }))
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    let data = &body["data"];
    assert_eq!(data["name"], "Pari Chowk Parking");
    assert_eq!(data["latitude"], 28.5744);
    assert_eq!(data["longitude"], 77.3564);
    assert_eq!(data["address"], "Address not provided");

    Ok(())
}

#[tokio::test]
async fn unqueried_lot_returns_404() -> Result<()> {
    // ---
    let base = spawn_api().await?;
    let client = Client::new();

    let resp = client
        .get(format!(
            "{}/api/arduino/parking?parkingLotId=Nowhere",
            base
        ))
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await?;
    assert_eq!(body["success"], false);

    Ok(())
}

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    // ---
    let base = spawn_api().await?;
    let body: Value = Client::new()
        .get(format!("{}/health", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["status"], "ok");

    Ok(())
}
