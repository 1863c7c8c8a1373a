//! Vehicles and the dispatch engine.
//!
//! - [`Vehicle`] — capacity-limited state machine with its own clock
//! - [`DeliveryEngine`] — drives vehicles through priority, constrained and
//!   standard waves

mod engine;
mod vehicle;

pub use engine::{DeliveryEngine, DispatchSummary, Wave};
pub use vehicle::{Vehicle, VehicleState};
