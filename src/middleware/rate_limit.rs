use axum::body::Body;
use std::sync::Arc;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};

/// Type alias for the global governor layer (IP-based rate limiting)
pub type GlobalGovernorLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    Body,
>;

/// Replenish one token every 100ms (600 per minute): a client polling ride
/// status twice a second alongside map refreshes stays well below it
const REPLENISH_PERIOD_MS: u64 = 100;
const BURST_SIZE: u32 = 200;

/// Per-IP limiter with the given replenish period and burst
pub fn governor_layer(period_ms: u64, burst: u32) -> GlobalGovernorLayer {
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(period_ms)
            .burst_size(burst)
            .finish()
            .expect("rate limit period and burst size must be non-zero"),
    );

    GovernorLayer::new(config)
}

pub fn create_global_governor() -> GlobalGovernorLayer {
    governor_layer(REPLENISH_PERIOD_MS, BURST_SIZE)
}
