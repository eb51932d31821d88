use serde::{Deserialize, Serialize};

/// Fixed pickup used when the device position is unavailable (San Francisco)
pub const FALLBACK_PICKUP: Coordinate = Coordinate {
    lat: 37.7749,
    lng: -122.4194,
};

/// Offset applied to a pickup to synthesize a destination, in degrees
pub const DESTINATION_OFFSET_DEG: f64 = 0.01;

/// A latitude/longitude pair in degrees. Out-of-range values are not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Shift by the given deltas (degrees) on each axis
    pub fn offset(&self, lat_delta: f64, lng_delta: f64) -> Self {
        Self {
            lat: self.lat + lat_delta,
            lng: self.lng + lng_delta,
        }
    }

    /// Point a fraction `t` of the way towards `other`
    pub fn lerp(&self, other: &Coordinate, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }

    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine_distance(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Synthetic destination for a pickup: pickup + (0.01°, 0.01°)
pub fn synthetic_destination(pickup: &Coordinate) -> Coordinate {
    pickup.offset(DESTINATION_OFFSET_DEG, DESTINATION_OFFSET_DEG)
}

/// Calculate distance between two coordinates using Haversine formula
/// Returns distance in kilometers
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}
