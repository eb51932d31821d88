use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::simulation::drivers::{ASSIGNED_DRIVER, DriverProfile};
use crate::simulation::location::{LocationFix, LocationSource};
use crate::simulation::ride::{RideEvent, RidePhase, RideState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RideTimings {
    /// Time spent searching before a driver is assigned
    pub driver_assign_delay: Duration,
    /// Interval between progress ticks once a driver is assigned
    pub tick_interval: Duration,
}

impl Default for RideTimings {
    fn default() -> Self {
        Self {
            driver_assign_delay: Duration::from_millis(3000),
            tick_interval: Duration::from_millis(500),
        }
    }
}

/// Value held in the session's watch channel. The cancel flag lives next to
/// the ride state so a tick and a cancel can never interleave.
#[derive(Debug, Clone, Copy)]
pub struct SessionState {
    pub ride: RideState,
    pub cancelled: bool,
}

impl SessionState {
    /// No further changes will happen
    pub fn is_finished(&self) -> bool {
        self.cancelled || self.ride.is_terminal()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RideSnapshot {
    pub phase: RidePhase,
    pub status: &'static str,
    pub eta: &'static str,
    pub progress: u8,
    pub driver_found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverProfile>,
    pub completed: bool,
    pub cancelled: bool,
    pub location: LocationFix,
}

/// A running simulated ride. Owns its timers and location source; `stop`
/// (or dropping the session) halts both.
pub struct RideSession {
    state: Arc<watch::Sender<SessionState>>,
    location: LocationSource,
    driver: JoinHandle<()>,
}

impl RideSession {
    /// Begin searching for a driver; ticking starts once one is assigned
    pub fn start(timings: RideTimings, location: LocationSource) -> Self {
        let (tx, _rx) = watch::channel(SessionState {
            ride: RideState::new(),
            cancelled: false,
        });
        let state = Arc::new(tx);

        let driver = tokio::spawn(drive(state.clone(), timings));

        Self {
            state,
            location,
            driver,
        }
    }

    /// Feed an event into the ride. Ignored once the session is stopped.
    pub fn apply(&self, event: RideEvent) -> bool {
        apply_event(&self.state, event)
    }

    pub fn snapshot(&self) -> RideSnapshot {
        let state = *self.state.borrow();
        RideSnapshot {
            phase: state.ride.phase(),
            status: state.ride.status_label(),
            eta: state.ride.eta_label(),
            progress: state.ride.progress(),
            driver_found: state.ride.driver_assigned(),
            driver: state.ride.driver_assigned().then_some(ASSIGNED_DRIVER),
            completed: state.ride.is_terminal(),
            cancelled: state.cancelled,
            location: self.location.fix(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn location(&self) -> &LocationSource {
        &self.location
    }

    /// Cancel pending timers. No state changes are observable afterwards.
    pub fn stop(&self) {
        self.state.send_modify(|s| s.cancelled = true);
        self.driver.abort();
        self.location.dispose();
    }

    pub fn is_stopped(&self) -> bool {
        self.state.borrow().cancelled
    }
}

impl Drop for RideSession {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

fn apply_event(state: &watch::Sender<SessionState>, event: RideEvent) -> bool {
    state.send_if_modified(|s| !s.cancelled && s.ride.apply(event))
}

async fn drive(state: Arc<watch::Sender<SessionState>>, timings: RideTimings) {
    tokio::time::sleep(timings.driver_assign_delay).await;
    if apply_event(&state, RideEvent::DriverAssigned) {
        tracing::debug!("Driver assigned");
    } else if state.borrow().cancelled {
        return;
    }
    // An external feed may have assigned the driver already; ticking still applies

    let mut interval = tokio::time::interval(timings.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;
        if !apply_event(&state, RideEvent::Tick) || state.borrow().ride.is_terminal() {
            break;
        }
    }

    if state.borrow().ride.is_terminal() {
        tracing::debug!("Ride completed");
    }
}
