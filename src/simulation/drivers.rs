use rand::Rng;
use serde::Serialize;

use crate::utils::geo::Coordinate;

/// Maximum offset from the user on either axis, in degrees (roughly 500 m)
pub const DRIVER_SCATTER_DEG: f64 = 0.005;

pub const MIN_DRIVERS: usize = 5;
pub const MAX_DRIVERS: usize = 8;

/// Profile shown once a driver accepts the ride
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriverProfile {
    pub name: &'static str,
    pub rating: f32,
    pub trips: u32,
    pub vehicle: &'static str,
    pub plate: &'static str,
}

pub const ASSIGNED_DRIVER: DriverProfile = DriverProfile {
    name: "James Wilson",
    rating: 4.92,
    trips: 2384,
    vehicle: "Toyota Camry",
    plate: "ABC 123",
};

/// Number of drivers to show when the caller doesn't ask for a specific count
pub fn random_driver_count<R: Rng>(rng: &mut R) -> usize {
    rng.gen_range(MIN_DRIVERS..=MAX_DRIVERS)
}

/// Scatter `count` drivers uniformly within ±0.005° of `center`.
/// Positions are fresh on every call.
pub fn generate_drivers<R: Rng>(
    rng: &mut R,
    center: &Coordinate,
    count: usize,
) -> Vec<Coordinate> {
    (0..count)
        .map(|_| {
            let lat_offset = rng.gen_range(-DRIVER_SCATTER_DEG..=DRIVER_SCATTER_DEG);
            let lng_offset = rng.gen_range(-DRIVER_SCATTER_DEG..=DRIVER_SCATTER_DEG);
            center.offset(lat_offset, lng_offset)
        })
        .collect()
}
