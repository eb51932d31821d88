use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

const RIDES_PREFIX: &str = "/api/rides/";

/// Ride id addressed by a `/api/rides/{id}` path, if any
pub fn ride_id_from_path(path: &str) -> Option<Uuid> {
    path.strip_prefix(RIDES_PREFIX)?
        .split('/')
        .next()?
        .parse()
        .ok()
}

/// Log every request with its outcome. Layered outside the rate limiter so
/// rejected requests are logged too.
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let ride_id = ride_id_from_path(&path);
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        tracing::warn!(
            client_ip = %addr.ip(),
            method = %method,
            path = %path,
            retry_after = retry_after.as_deref(),
            "Rate limited"
        );
    } else if status.is_client_error() || status.is_server_error() {
        tracing::warn!(
            client_ip = %addr.ip(),
            method = %method,
            path = %path,
            ride_id = ride_id.map(tracing::field::display),
            status = %status,
            elapsed_ms,
            "Request failed"
        );
    } else {
        tracing::debug!(
            client_ip = %addr.ip(),
            method = %method,
            path = %path,
            ride_id = ride_id.map(tracing::field::display),
            status = %status,
            elapsed_ms,
            "Request handled"
        );
    }

    response
}
