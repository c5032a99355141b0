//! Data models for the parking telemetry pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::locations;

/// Default hourly parking rate (INR) assigned to sensor-fed lots.
pub const DEFAULT_HOURLY_RATE: i32 = 30;

// ---

/// Raw parking update as sent over the wire (serial frame payload and HTTP
/// request body share this shape).
///
/// Required fields are modelled as `Option` so a single deserialization pass
/// accepts any syntactically valid object; [`RawParkingUpdate::missing_fields`]
/// then reports absent required fields by name for the 400 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParkingUpdate {
    // ---
    pub parking_lot_id: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub total_slots: Option<i64>,
    pub available_slots: Option<i64>,
    pub occupied_slots: Option<i64>,
    pub occupancy_rate: Option<f64>,
    /// Caller-supplied observation time (RFC 3339). Server time is used when absent.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Normalized parking record as stored and served by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ParkingStatus {
    // ---
    pub parking_lot_id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub total_slots: i32,
    pub available_slots: i32,
    pub occupied_slots: i32,
    pub occupancy_rate: f64,
    pub hourly_rate: i32,
    pub sensor_connected: bool,
    pub last_updated: DateTime<Utc>,
}

impl RawParkingUpdate {
    // ---

    /// Names of required fields absent from this update, in a stable order.
    ///
    /// An empty `parkingLotId` counts as missing; a lot identifier is the
    /// upsert key and cannot be blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        // ---
        let mut missing = Vec::new();
        if self.parking_lot_id.as_deref().map_or(true, str::is_empty) {
            missing.push("parkingLotId");
        }
        if self.total_slots.is_none() {
            missing.push("totalSlots");
        }
        if self.available_slots.is_none() {
            missing.push("availableSlots");
        }
        missing
    }

    /// Normalize into a [`ParkingStatus`] ready for storage.
    ///
    /// Must only be called after [`missing_fields`](Self::missing_fields)
    /// returned empty; required fields are taken as present here.
    ///
    /// Normalization:
    /// - facility metadata filled from [`locations::lookup`], falling back to
    ///   the caller-supplied name/address and the default coordinate for
    ///   unknown lots
    /// - slot counts clamped so `0 <= available <= total` and
    ///   `occupied + available == total` always hold in stored data
    /// - `occupiedSlots` / `occupancyRate` derived when omitted
    /// - `lastUpdated` is the caller timestamp if supplied, else `now`
    pub fn normalize(&self, now: DateTime<Utc>) -> ParkingStatus {
        // ---
        let lot_id = self.parking_lot_id.clone().unwrap_or_default();

        let (name, address, coords) = match locations::lookup(&lot_id) {
            Some(loc) => (loc.name.to_string(), loc.address.to_string(), loc.coords),
            None => (
                self.name.clone().unwrap_or_else(|| lot_id.clone()),
                self.address
                    .clone()
                    .unwrap_or_else(|| locations::DEFAULT_ADDRESS.to_string()),
                locations::DEFAULT_COORDS,
            ),
        };

        // Clamp policy for sensor noise: out-of-range counts are pulled back
        // into [0, total] rather than rejected.
        let total = self.total_slots.unwrap_or(0).max(0);
        let available = self.available_slots.unwrap_or(0).clamp(0, total);
        let occupied = self
            .occupied_slots
            .map(|o| o.clamp(0, total))
            .unwrap_or(total - available);
        let occupancy_rate = self
            .occupancy_rate
            .map(|r| r.clamp(0.0, 100.0))
            .unwrap_or_else(|| {
                if total > 0 {
                    occupied as f64 / total as f64 * 100.0
                } else {
                    0.0
                }
            });

        ParkingStatus {
            parking_lot_id: lot_id,
            name,
            address,
            latitude: coords.0,
            longitude: coords.1,
            total_slots: total as i32,
            available_slots: available as i32,
            occupied_slots: occupied as i32,
            occupancy_rate,
            hourly_rate: DEFAULT_HOURLY_RATE,
            sensor_connected: true,
            last_updated: self.timestamp.unwrap_or(now),
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn create_test_update(total: i64, available: i64) -> RawParkingUpdate {
        // ---
        RawParkingUpdate {
            parking_lot_id: Some("SAB_Mall_Parking".to_string()),
            name: None,
            address: None,
            total_slots: Some(total),
            available_slots: Some(available),
            occupied_slots: None,
            occupancy_rate: None,
            timestamp: None,
        }
    }

    fn test_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 12, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_derived_fields() {
        // ---
        let status = create_test_update(100, 30).normalize(test_now());

        assert_eq!(status.occupied_slots, 70);
        assert_eq!(status.occupancy_rate, 70.0);
        assert_eq!(status.last_updated, test_now());
    }

    #[test]
    fn test_supplied_fields_win_over_derivation() {
        // ---
        let mut raw = create_test_update(100, 30);
        raw.occupied_slots = Some(65);
        raw.occupancy_rate = Some(65.0);

        let status = raw.normalize(test_now());
        assert_eq!(status.occupied_slots, 65);
        assert_eq!(status.occupancy_rate, 65.0);
    }

    #[test]
    fn test_known_lot_metadata() {
        // ---
        let status = create_test_update(50, 20).normalize(test_now());

        assert_eq!(status.name, "SAB Mall Parking");
        assert_eq!(status.latitude, 28.567582);
        assert_eq!(status.longitude, 77.322673);
        assert_eq!(status.hourly_rate, DEFAULT_HOURLY_RATE);
        assert!(status.sensor_connected);
    }

    #[test]
    fn test_unknown_lot_fallback() {
        // ---
        let mut raw = create_test_update(10, 4);
        raw.parking_lot_id = Some("Mystery_Lot".to_string());

        let status = raw.normalize(test_now());
        assert_eq!(status.name, "Mystery_Lot");
        assert_eq!(status.address, "Address not provided");
        assert_eq!((status.latitude, status.longitude), (28.5744, 77.3564));

        // A supplied display name takes precedence over the raw id
        let mut named = create_test_update(10, 4);
        named.parking_lot_id = Some("Mystery_Lot".to_string());
        named.name = Some("Mystery Mall".to_string());
        assert_eq!(named.normalize(test_now()).name, "Mystery Mall");
    }

    #[test]
    fn test_clamping_out_of_range_counts() {
        // ---
        // Sensor glitch: more free slots than capacity
        let status = create_test_update(50, 80).normalize(test_now());
        assert_eq!(status.available_slots, 50);
        assert_eq!(status.occupied_slots, 0);
        assert_eq!(status.occupancy_rate, 0.0);

        // Negative available
        let status = create_test_update(50, -3).normalize(test_now());
        assert_eq!(status.available_slots, 0);
        assert_eq!(status.occupied_slots, 50);
        assert_eq!(status.occupancy_rate, 100.0);

        // Zero-capacity lot never divides by zero
        let status = create_test_update(0, 0).normalize(test_now());
        assert_eq!(status.occupancy_rate, 0.0);
    }

    #[test]
    fn test_missing_fields_reported_by_name() {
        // ---
        let raw = RawParkingUpdate {
            parking_lot_id: None,
            name: None,
            address: None,
            total_slots: None,
            available_slots: Some(5),
            occupied_slots: None,
            occupancy_rate: None,
            timestamp: None,
        };
        assert_eq!(raw.missing_fields(), vec!["parkingLotId", "totalSlots"]);

        // Empty lot id counts as missing
        let mut raw = create_test_update(10, 5);
        raw.parking_lot_id = Some(String::new());
        assert_eq!(raw.missing_fields(), vec!["parkingLotId"]);

        assert!(create_test_update(10, 5).missing_fields().is_empty());
    }

    #[test]
    fn test_wire_field_names_are_camel_case() {
        // ---
        let raw: RawParkingUpdate = serde_json::from_str(
            r#"{"parkingLotId":"SAB_Mall_Parking","totalSlots":12,"availableSlots":7}"#,
        )
        .unwrap();
        assert_eq!(raw.parking_lot_id.as_deref(), Some("SAB_Mall_Parking"));

        let json = serde_json::to_value(raw.normalize(test_now())).unwrap();
        assert_eq!(json["availableSlots"], 7);
        assert_eq!(json["occupiedSlots"], 5);
    }
}
