//! Static lookup table of known parking facilities.
//!
//! The Arduino sensors report only a lot identifier; display name, address,
//! and GPS coordinates come from this table. Lots not listed here fall back
//! to [`DEFAULT_COORDS`] (Noida City Centre area) so an unknown sensor still
//! shows up on the map rather than being rejected.

// ---

/// Fallback coordinate for lots missing from the table.
pub const DEFAULT_COORDS: (f64, f64) = (28.5744, 77.3564);

/// Fallback address string when neither the table nor the caller supplies one.
pub const DEFAULT_ADDRESS: &str = "Address not provided";

/// Static facility metadata for a known parking lot.
#[derive(Debug, Clone, Copy)]
pub struct LotLocation {
    pub name: &'static str,
    pub address: &'static str,
    /// (latitude, longitude)
    pub coords: (f64, f64),
}

const KNOWN_LOTS: &[(&str, LotLocation)] = &[
    (
        "SAB_Mall_Parking",
        LotLocation {
            name: "SAB Mall Parking",
            address: "313 B E, I Block, Pocket E, Sector 27, Noida",
            coords: (28.567582, 77.322673),
        },
    ),
    (
        "Noida_City_Centre_Metro_Vehicle_Parking",
        LotLocation {
            name: "Noida City Centre Metro Vehicle Parking",
            address: "Noida City Centre Metro Station, Sector 32, Noida",
            coords: (28.5744, 77.3564),
        },
    ),
];

/// Look up facility metadata for a lot identifier.
pub fn lookup(lot_id: &str) -> Option<&'static LotLocation> {
    // ---
    KNOWN_LOTS
        .iter()
        .find(|(id, _)| *id == lot_id)
        .map(|(_, loc)| loc)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn known_lot_resolves() {
        let loc = lookup("SAB_Mall_Parking").unwrap();
        assert_eq!(loc.name, "SAB Mall Parking");
        assert_eq!(loc.coords, (28.567582, 77.322673));
    }

    #[test]
    fn unknown_lot_is_none() {
        assert!(lookup("Some_Other_Lot").is_none());
    }
}
