use serde::Serialize;

/// Progress value at which a ride is complete
pub const MAX_PROGRESS: u8 = 100;

/// Progress below which the driver is still heading to the pickup
const PICKUP_LEG_END: u8 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RidePhase {
    Searching,
    DriverAssigned,
    EnRoute,
    Arrived,
}

/// Input to the transition table, from the session timers or any other feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideEvent {
    /// A driver accepted the ride; progress ticking may begin
    DriverAssigned,
    /// One unit of progress elapsed
    Tick,
}

/// Status and ETA labels for a progress value once a driver is assigned
pub fn labels_for_progress(progress: u8) -> (&'static str, &'static str) {
    match progress {
        0..30 => ("Driver is on the way", "5 min"),
        30..60 => ("Driver is arriving", "2 min"),
        60..90 => ("On trip to destination", "8 min"),
        90..MAX_PROGRESS => ("Arriving at destination", "1 min"),
        _ => ("Ride completed", "Arrived"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RideState {
    driver_assigned: bool,
    progress: u8,
}

impl Default for RideState {
    fn default() -> Self {
        Self::new()
    }
}

impl RideState {
    pub fn new() -> Self {
        Self {
            driver_assigned: false,
            progress: 0,
        }
    }

    /// Apply an event, returning whether the state changed.
    /// Ticks before assignment and after completion are ignored.
    pub fn apply(&mut self, event: RideEvent) -> bool {
        match event {
            RideEvent::DriverAssigned if !self.driver_assigned => {
                self.driver_assigned = true;
                true
            }
            RideEvent::Tick if self.driver_assigned && !self.is_terminal() => {
                self.progress += 1;
                true
            }
            _ => false,
        }
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn driver_assigned(&self) -> bool {
        self.driver_assigned
    }

    pub fn is_terminal(&self) -> bool {
        self.progress >= MAX_PROGRESS
    }

    pub fn phase(&self) -> RidePhase {
        if !self.driver_assigned {
            RidePhase::Searching
        } else if self.progress < PICKUP_LEG_END {
            RidePhase::DriverAssigned
        } else if self.progress < MAX_PROGRESS {
            RidePhase::EnRoute
        } else {
            RidePhase::Arrived
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.driver_assigned {
            labels_for_progress(self.progress).0
        } else {
            "Finding your driver"
        }
    }

    pub fn eta_label(&self) -> &'static str {
        if self.driver_assigned {
            labels_for_progress(self.progress).1
        } else {
            "5 min"
        }
    }
}
