pub mod drivers;
pub mod location;
pub mod projection;
pub mod ride;
pub mod session;

pub use location::{DevicePosition, GeoProvider, LocationFix, LocationSource, Unavailable};
pub use projection::{MapRequest, MapView, Renderer};
pub use ride::{RideEvent, RidePhase, RideState};
pub use session::{RideSession, RideSnapshot, RideTimings};
