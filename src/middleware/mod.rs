pub mod rate_limit;
pub mod request_log;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use rate_limit::GlobalGovernorLayer;

/// Wrap the API router in the service's middleware stack. The last layer is
/// outermost, so request logging sees responses produced by the limiter.
pub fn apply(router: Router, governor: GlobalGovernorLayer) -> Router {
    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(governor)
        .layer(axum::middleware::from_fn(request_log::log_request))
}
