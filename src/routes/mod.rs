use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;
use crate::handlers::{map, payments, rides};

pub fn create_router(state: AppState) -> Router {
    let ride_routes = Router::new()
        .route("/", post(rides::book_ride))
        .route("/{id}", get(rides::get_ride).delete(rides::cancel_ride))
        .route("/{id}/map", get(rides::ride_map));

    let payment_routes = Router::new()
        .route("/intent", post(payments::create_payment_intent))
        .route("/{intent_id}/confirm", post(payments::confirm_payment));

    Router::new()
        .route("/api/ride-types", get(rides::list_ride_types))
        .route("/api/map", get(map::map_view))
        .nest("/api/rides", ride_routes)
        .nest("/api/payments", payment_routes)
        .with_state(state)
}
