use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::simulation::RideTimings;
use crate::simulation::projection::DEFAULT_ZOOM;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub payment: PaymentConfig,
    pub simulation: SimulationConfig,
}

#[derive(Clone, Debug)]
pub struct PaymentConfig {
    pub api_url: String,
    pub secret_key: String,
    pub currency: String,
    /// Flat demo fare charged per ride, in major units
    pub ride_fare: f64,
}

#[derive(Clone, Debug)]
pub struct SimulationConfig {
    pub driver_assign_delay_ms: u64,
    pub tick_interval_ms: u64,
    pub destination_delay_ms: u64,
    pub map_zoom: u8,
    /// How long a finished ride stays queryable before it is evicted
    pub ride_retention_ms: u64,
    /// Fixed seed for synthetic drivers; entropy when unset
    pub seed: Option<u64>,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.stripe.com".to_string(),
            secret_key: String::new(),
            currency: "usd".to_string(),
            ride_fare: 18.75,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            driver_assign_delay_ms: 3000,
            tick_interval_ms: 500,
            destination_delay_ms: 1000,
            map_zoom: DEFAULT_ZOOM,
            ride_retention_ms: 300_000,
            seed: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            payment: PaymentConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{} must be a valid {}", name, std::any::type_name::<T>())),
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        Self {
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            payment: PaymentConfig {
                api_url: env::var("PAYMENT_API_URL").unwrap_or(defaults.payment.api_url),
                secret_key: env::var("PAYMENT_SECRET_KEY").unwrap_or_default(),
                currency: env::var("PAYMENT_CURRENCY").unwrap_or(defaults.payment.currency),
                ride_fare: parse_var("RIDE_FARE", defaults.payment.ride_fare),
            },
            simulation: SimulationConfig {
                driver_assign_delay_ms: parse_var(
                    "DRIVER_ASSIGN_DELAY_MS",
                    defaults.simulation.driver_assign_delay_ms,
                ),
                tick_interval_ms: parse_var("TICK_INTERVAL_MS", defaults.simulation.tick_interval_ms),
                destination_delay_ms: parse_var(
                    "DESTINATION_DELAY_MS",
                    defaults.simulation.destination_delay_ms,
                ),
                map_zoom: parse_var("MAP_ZOOM", defaults.simulation.map_zoom),
                ride_retention_ms: parse_var(
                    "RIDE_RETENTION_MS",
                    defaults.simulation.ride_retention_ms,
                ),
                seed: env::var("SIM_SEED")
                    .ok()
                    .map(|s| s.parse().expect("SIM_SEED must be a number")),
            },
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl SimulationConfig {
    pub fn ride_timings(&self) -> RideTimings {
        RideTimings {
            driver_assign_delay: Duration::from_millis(self.driver_assign_delay_ms),
            // tokio intervals reject a zero period
            tick_interval: Duration::from_millis(self.tick_interval_ms.max(1)),
        }
    }

    pub fn destination_delay(&self) -> Duration {
        Duration::from_millis(self.destination_delay_ms)
    }

    pub fn ride_retention(&self) -> Duration {
        Duration::from_millis(self.ride_retention_ms)
    }
}
