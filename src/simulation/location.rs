use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::utils::geo::{Coordinate, FALLBACK_PICKUP, synthetic_destination};

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Geolocation is not available")]
    Unavailable,
    #[error("Geolocation request failed: {0}")]
    Failed(String),
}

/// One-shot device position query
#[async_trait]
pub trait GeoProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, LocationError>;
}

/// Position reported by the client device
#[derive(Debug, Clone, Copy)]
pub struct DevicePosition(pub Coordinate);

#[async_trait]
impl GeoProvider for DevicePosition {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }
}

/// Client did not share a position
#[derive(Debug, Clone, Copy)]
pub struct Unavailable;

#[async_trait]
impl GeoProvider for Unavailable {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unavailable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixSource {
    Pending,
    Device,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationFix {
    pub pickup: Option<Coordinate>,
    pub destination: Option<Coordinate>,
    pub source: FixSource,
}

#[derive(Debug)]
struct LocationState {
    fix: LocationFix,
    disposed: bool,
}

/// Queries the provider once. A device fix gets a synthetic destination
/// shortly afterwards; a failure falls back to a fixed pickup.
pub struct LocationSource {
    state: Arc<watch::Sender<LocationState>>,
    task: JoinHandle<()>,
}

impl LocationSource {
    /// Start the position query. `destination_delay` is how long after a
    /// device fix the synthetic destination appears.
    pub fn start(provider: Arc<dyn GeoProvider>, destination_delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(LocationState {
            fix: LocationFix {
                pickup: None,
                destination: None,
                source: FixSource::Pending,
            },
            disposed: false,
        });
        let state = Arc::new(tx);

        let task = tokio::spawn(resolve(state.clone(), provider, destination_delay));

        Self { state, task }
    }

    pub fn fix(&self) -> LocationFix {
        self.state.borrow().fix
    }

    /// Wait until a pickup is known. Returns `None` if the source was disposed first.
    pub async fn wait_for_pickup(&self) -> Option<Coordinate> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|s| s.fix.pickup.is_some() || s.disposed)
            .await
            .ok()?;
        if state.disposed { None } else { state.fix.pickup }
    }

    /// Placeholder geocoding: any non-empty query maps to pickup + (0.01°, 0.01°),
    /// an empty one clears the destination.
    pub fn set_destination_query(&self, query: &str) -> Option<Coordinate> {
        let mut destination = None;
        self.state.send_if_modified(|s| {
            if s.disposed {
                return false;
            }
            destination = match (query.trim().is_empty(), s.fix.pickup) {
                (false, Some(pickup)) => Some(synthetic_destination(&pickup)),
                _ => None,
            };
            s.fix.destination = destination;
            true
        });
        destination
    }

    /// Stop the source; a query or scheduled destination completing later is dropped
    pub fn dispose(&self) {
        self.state.send_modify(|s| s.disposed = true);
        self.task.abort();
    }

    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }
}

impl Drop for LocationSource {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn resolve(
    state: Arc<watch::Sender<LocationState>>,
    provider: Arc<dyn GeoProvider>,
    destination_delay: Duration,
) {
    let pickup = match provider.current_position().await {
        Ok(pickup) => pickup,
        Err(e) => {
            tracing::debug!(error = %e, "Device location unavailable, using fallback pickup");
            state.send_if_modified(|s| {
                if s.disposed {
                    return false;
                }
                s.fix.pickup = Some(FALLBACK_PICKUP);
                s.fix.source = FixSource::Fallback;
                true
            });
            return;
        }
    };

    let applied = state.send_if_modified(|s| {
        if s.disposed {
            return false;
        }
        s.fix.pickup = Some(pickup);
        s.fix.source = FixSource::Device;
        true
    });
    if !applied {
        tracing::debug!("Discarding device location resolved after dispose");
        return;
    }

    tokio::time::sleep(destination_delay).await;

    state.send_if_modified(|s| {
        if s.disposed || s.fix.destination.is_some() {
            return false;
        }
        s.fix.destination = Some(synthetic_destination(&pickup));
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Answers only after a delay, to exercise late resolution
    struct SlowDevice {
        position: Coordinate,
        delay: Duration,
    }

    #[async_trait]
    impl GeoProvider for SlowDevice {
        async fn current_position(&self) -> Result<Coordinate, LocationError> {
            tokio::time::sleep(self.delay).await;
            Ok(self.position)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_falls_back() {
        let source = LocationSource::start(Arc::new(Unavailable), Duration::from_secs(1));

        assert_eq!(source.wait_for_pickup().await, Some(FALLBACK_PICKUP));
        tokio::time::sleep(Duration::from_secs(5)).await;

        let fix = source.fix();
        assert_eq!(fix.source, FixSource::Fallback);
        assert_eq!(fix.destination, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_device_fix_schedules_destination() {
        let device = Coordinate::new(10.0, 20.0);
        let source = LocationSource::start(Arc::new(DevicePosition(device)), Duration::from_secs(1));

        assert_eq!(source.wait_for_pickup().await, Some(device));
        assert_eq!(source.fix().source, FixSource::Device);
        assert_eq!(source.fix().destination, None);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(source.fix().destination, Some(synthetic_destination(&device)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_destination_query_on_fallback() {
        let source = LocationSource::start(Arc::new(Unavailable), Duration::from_secs(1));
        source.wait_for_pickup().await;

        let dest = source.set_destination_query("456 Market St").unwrap();
        assert!((dest.lat - 37.7849).abs() < 1e-9);
        assert!((dest.lng - -122.4094).abs() < 1e-9);
        assert_eq!(source.fix().destination, Some(dest));

        assert_eq!(source.set_destination_query("   "), None);
        assert_eq!(source.fix().destination, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_destination_query_before_pickup_is_ignored() {
        let source = LocationSource::start(
            Arc::new(SlowDevice {
                position: Coordinate::new(1.0, 1.0),
                delay: Duration::from_secs(2),
            }),
            Duration::from_secs(1),
        );

        assert_eq!(source.set_destination_query("Airport"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_resolution_after_dispose_is_discarded() {
        let source = LocationSource::start(
            Arc::new(SlowDevice {
                position: Coordinate::new(1.0, 1.0),
                delay: Duration::from_secs(2),
            }),
            Duration::from_secs(1),
        );

        tokio::time::sleep(Duration::from_millis(500)).await;
        source.dispose();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let fix = source.fix();
        assert!(source.is_disposed());
        assert_eq!(fix.pickup, None);
        assert_eq!(fix.source, FixSource::Pending);
        assert_eq!(source.wait_for_pickup().await, None);
    }
}
