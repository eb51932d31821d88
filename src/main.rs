use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ride_sim_backend::{
    AppState,
    config::Config,
    middleware::{self, rate_limit::create_global_governor},
    payment::StripeClient,
    routes,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ride_sim_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!("Starting server at {}", config.server_addr());

    if config.payment.secret_key.is_empty() {
        tracing::warn!("PAYMENT_SECRET_KEY is not set, payment intents will be rejected");
    }
    if let Some(seed) = config.simulation.seed {
        tracing::info!(seed, "Synthetic drivers use a fixed seed");
    }

    let payments = StripeClient::new(&config.payment.api_url, &config.payment.secret_key);
    let state = AppState::new(config.clone(), Arc::new(payments));
    let rides = state.rides.clone();

    // Create router with middleware
    let app = middleware::apply(routes::create_router(state), create_global_governor());

    // Start server with socket address for rate limiting
    let addr: SocketAddr = config.server_addr().parse().expect("Invalid address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");

    // Halt any rides still ticking
    let mut rides = rides.write().await;
    for (_, ride) in rides.drain() {
        ride.session.stop();
    }
    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
