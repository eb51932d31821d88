pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod payment;
pub mod pricing;
pub mod routes;
pub mod simulation;
pub mod utils;

use std::collections::HashMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub use config::Config;
pub use error::{AppError, AppResult};

use handlers::rides::ActiveRide;
use payment::PaymentProvider;

pub type RideRegistry = Arc<RwLock<HashMap<Uuid, ActiveRide>>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub rides: RideRegistry,
    pub payments: Arc<dyn PaymentProvider>,
    /// Source for synthetic driver placement
    pub rng: Arc<Mutex<StdRng>>,
}

impl AppState {
    pub fn new(config: Config, payments: Arc<dyn PaymentProvider>) -> Self {
        let rng = match config.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            config,
            rides: Arc::new(RwLock::new(HashMap::new())),
            payments,
            rng: Arc::new(Mutex::new(rng)),
        }
    }
}
