pub mod map;
pub mod payments;
pub mod rides;
