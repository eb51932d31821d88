use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, RideRegistry};
use crate::error::{AppError, AppResult};
use crate::handlers::map::MapOptions;
use crate::payment::PaymentStatus;
use crate::pricing::{FareRange, RideType, RideTypeInfo};
use crate::simulation::projection::{self, MapRequest, MapView};
use crate::simulation::{
    DevicePosition, GeoProvider, LocationSource, RideSession, RideSnapshot, Unavailable,
    session::SessionState,
};
use crate::utils::geo::Coordinate;

/// A booked ride and the session simulating it
pub struct ActiveRide {
    pub id: Uuid,
    pub ride_type: RideType,
    pub pickup: String,
    pub destination: String,
    pub fare: f64,
    pub created_at: DateTime<Utc>,
    pub session: RideSession,
}

#[derive(Debug, Deserialize)]
pub struct BookRideRequest {
    pub pickup: String,
    pub destination: String,
    #[serde(default)]
    pub ride_type: RideType,
    /// Position reported by the client device, if it shared one
    pub device_location: Option<Coordinate>,
}

#[derive(Debug, Deserialize)]
pub struct RideStatusQuery {
    pub payment_intent_status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RideResponse {
    pub id: Uuid,
    pub ride_type: RideType,
    pub pickup: String,
    pub destination: String,
    pub fare: f64,
    pub fare_estimate: FareRange,
    pub distance_km: Option<f64>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub snapshot: RideSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentStatus>,
}

impl ActiveRide {
    fn to_response(&self, payment: Option<PaymentStatus>) -> RideResponse {
        let snapshot = self.session.snapshot();
        let distance_km = match (snapshot.location.pickup, snapshot.location.destination) {
            (Some(pickup), Some(destination)) => Some(pickup.distance_km(&destination)),
            _ => None,
        };

        RideResponse {
            id: self.id,
            ride_type: self.ride_type,
            pickup: self.pickup.clone(),
            destination: self.destination.clone(),
            fare: self.fare,
            fare_estimate: self.ride_type.fare_range(),
            distance_km,
            created_at: self.created_at,
            snapshot,
            payment,
        }
    }
}

/// List ride types with fare estimates
pub async fn list_ride_types() -> Json<Vec<RideTypeInfo>> {
    Json(RideType::ALL.iter().map(RideType::info).collect())
}

/// Book a ride and start simulating it
pub async fn book_ride(
    State(state): State<AppState>,
    Json(payload): Json<BookRideRequest>,
) -> AppResult<Json<RideResponse>> {
    let pickup = payload.pickup.trim();
    let destination = payload.destination.trim();
    if pickup.is_empty() || destination.is_empty() {
        return Err(AppError::BadRequest(
            "Pickup and destination are required".to_string(),
        ));
    }

    let provider: Arc<dyn GeoProvider> = match payload.device_location {
        Some(position) => Arc::new(DevicePosition(position)),
        None => Arc::new(Unavailable),
    };

    let sim = &state.config.simulation;
    let location = LocationSource::start(provider, sim.destination_delay());
    location
        .wait_for_pickup()
        .await
        .ok_or_else(|| AppError::Internal("Location source stopped before resolving".to_string()))?;
    location.set_destination_query(destination);

    let ride = ActiveRide {
        id: Uuid::new_v4(),
        ride_type: payload.ride_type,
        pickup: pickup.to_string(),
        destination: destination.to_string(),
        fare: state.config.payment.ride_fare,
        created_at: Utc::now(),
        session: RideSession::start(sim.ride_timings(), location),
    };

    tracing::info!(
        ride_id = %ride.id,
        ride_type = ?ride.ride_type,
        device_location = payload.device_location.is_some(),
        "Ride booked"
    );

    let response = ride.to_response(None);
    evict_when_finished(&state.rides, &ride, sim.ride_retention());
    state.rides.write().await.insert(ride.id, ride);

    Ok(Json(response))
}

/// Drop a ride from the registry once it has been finished for `retention`
fn evict_when_finished(rides: &RideRegistry, ride: &ActiveRide, retention: Duration) {
    let rides = rides.clone();
    let ride_id = ride.id;
    let mut updates = ride.session.subscribe();

    tokio::spawn(async move {
        // A dropped session counts as finished too
        let _ = updates.wait_for(SessionState::is_finished).await;
        tokio::time::sleep(retention).await;
        if rides.write().await.remove(&ride_id).is_some() {
            tracing::debug!(ride_id = %ride_id, "Finished ride evicted");
        }
    });
}

/// Current status of a ride
pub async fn get_ride(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
    Query(query): Query<RideStatusQuery>,
) -> AppResult<Json<RideResponse>> {
    let rides = state.rides.read().await;
    let ride = rides
        .get(&ride_id)
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    let payment = PaymentStatus::from_redirect(query.payment_intent_status.as_deref());

    Ok(Json(ride.to_response(Some(payment))))
}

/// Cancel a ride, stopping its timers
pub async fn cancel_ride(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let ride = state
        .rides
        .write()
        .await
        .remove(&ride_id)
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    ride.session.stop();
    tracing::info!(ride_id = %ride_id, progress = ride.session.snapshot().progress, "Ride cancelled");

    Ok(Json(serde_json::json!({ "message": "Ride cancelled" })))
}

/// Map for a ride's current pickup and destination
pub async fn ride_map(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
    Query(options): Query<MapOptions>,
) -> AppResult<Json<MapView>> {
    let fix = {
        let rides = state.rides.read().await;
        rides
            .get(&ride_id)
            .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?
            .session
            .location()
            .fix()
    };

    let request = MapRequest {
        user: fix.pickup,
        destination: fix.destination,
        ..options.to_request(state.config.simulation.map_zoom)
    };

    let mut rng = state.rng.lock().await;
    Ok(Json(projection::render(&request, &mut *rng)))
}
