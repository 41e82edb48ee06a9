//! Great-circle distance between coordinates.
//!
//! Foundation for candidate scoring: every assignment decision starts from
//! the haversine distance between a task and a volunteer.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance reported when either coordinate is unknown.
///
/// An unknown location is treated as "very close" (1 km) rather than
/// excluded from matching. Intake frequently produces records with no
/// fix yet, and dropping them would leave those tasks unserved.
pub const UNKNOWN_DISTANCE_KM: f64 = 1.0;

/// A latitude/longitude pair in decimal degrees.
///
/// A zero component means the source never produced a fix; see
/// [`Coord::is_unknown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lng: f64,
}

impl Coord {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether this coordinate carries no usable fix.
    ///
    /// Upstream data sources default missing positions to zero, so a zero
    /// latitude or longitude is read as "unknown", not as a point on the
    /// equator or prime meridian.
    pub fn is_unknown(&self) -> bool {
        self.lat == 0.0 || self.lng == 0.0
    }
}

/// Great-circle distance in kilometres between two coordinates.
///
/// Uses the haversine formula on a sphere of radius [`EARTH_RADIUS_KM`].
/// If either coordinate is unknown, returns exactly
/// [`UNKNOWN_DISTANCE_KM`] instead of computing.
pub fn distance_km(a: Coord, b: Coord) -> f64 {
    if a.is_unknown() || b.is_unknown() {
        return UNKNOWN_DISTANCE_KM;
    }

    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_symmetric() {
        let a = Coord::new(12.8234, 80.0424);
        let b = Coord::new(12.8150, 80.0500);
        assert_eq!(distance_km(a, b), distance_km(b, a));
    }

    #[test]
    fn self_distance_is_zero() {
        let a = Coord::new(12.8234, 80.0424);
        assert_eq!(distance_km(a, a), 0.0);
    }

    #[test]
    fn nearby_points_within_expected_range() {
        // Roughly 1.2 km apart on the ground.
        let a = Coord::new(12.8234, 80.0424);
        let b = Coord::new(12.8150, 80.0500);
        let d = distance_km(a, b);
        assert!(d > 1.0 && d < 1.5, "unexpected distance {d}");
    }

    #[test]
    fn unknown_coordinate_falls_back_to_one_km() {
        let known = Coord::new(12.8234, 80.0424);
        assert_eq!(distance_km(Coord::new(0.0, 80.0), known), 1.0);
        assert_eq!(distance_km(Coord::new(12.8, 0.0), known), 1.0);
        assert_eq!(distance_km(known, Coord::default()), 1.0);
    }
}
