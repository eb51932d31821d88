use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::AppState;
use crate::simulation::projection::{self, MapRequest, MapView, Renderer};
use crate::utils::geo::{Coordinate, synthetic_destination};

/// Upper bound on an explicitly requested driver count
const MAX_REQUESTED_DRIVERS: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct MapOptions {
    pub show_drivers: Option<bool>,
    pub renderer: Option<Renderer>,
    /// Fixed number of synthetic drivers
    pub drivers: Option<usize>,
}

impl MapOptions {
    pub fn to_request(&self, zoom: u8) -> MapRequest {
        MapRequest {
            show_drivers: self.show_drivers.unwrap_or(true),
            driver_count: self.drivers.map(|n| n.min(MAX_REQUESTED_DRIVERS)),
            renderer: self.renderer.unwrap_or_default(),
            zoom,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MapQuery {
    pub user_lat: Option<f64>,
    pub user_lng: Option<f64>,
    pub dest_lat: Option<f64>,
    pub dest_lng: Option<f64>,
    /// Free-text destination, used when no destination coordinates are given
    pub destination: Option<String>,
    pub show_drivers: Option<bool>,
    pub renderer: Option<Renderer>,
    pub drivers: Option<usize>,
}

impl MapQuery {
    fn options(&self) -> MapOptions {
        MapOptions {
            show_drivers: self.show_drivers,
            renderer: self.renderer,
            drivers: self.drivers,
        }
    }
}

fn coordinate(lat: Option<f64>, lng: Option<f64>) -> Option<Coordinate> {
    Some(Coordinate::new(lat?, lng?))
}

/// Map for arbitrary coordinates, e.g. while a ride is being booked
pub async fn map_view(
    State(state): State<AppState>,
    Query(query): Query<MapQuery>,
) -> Json<MapView> {
    let user = coordinate(query.user_lat, query.user_lng);
    let destination = coordinate(query.dest_lat, query.dest_lng).or_else(|| {
        let text = query.destination.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }
        user.as_ref().map(synthetic_destination)
    });

    let request = MapRequest {
        user,
        destination,
        ..query.options().to_request(state.config.simulation.map_zoom)
    };

    let mut rng = state.rng.lock().await;
    Json(projection::render(&request, &mut *rng))
}
