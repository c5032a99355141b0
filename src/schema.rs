//! Database schema management for `parkride-telemetry`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `parking_status` table holding the latest normalized record
/// per lot. Safe to call on every startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // One row per lot, keyed by the sensor-reported identifier; upserts from
    // the ingestion endpoint overwrite in place
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS parking_status (
            parking_lot_id   TEXT PRIMARY KEY,
            name             TEXT             NOT NULL,
            address          TEXT             NOT NULL,
            latitude         DOUBLE PRECISION NOT NULL,
            longitude        DOUBLE PRECISION NOT NULL,
            total_slots      INTEGER          NOT NULL,
            available_slots  INTEGER          NOT NULL,
            occupied_slots   INTEGER          NOT NULL,
            occupancy_rate   DOUBLE PRECISION NOT NULL,
            hourly_rate      INTEGER          NOT NULL,
            sensor_connected BOOLEAN          NOT NULL,
            last_updated     TIMESTAMPTZ      NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Freshness queries from the map frontend sort by update time
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_parking_status_last_updated
            ON parking_status (last_updated);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
