//! Domain model types for delivery dispatch.
//!
//! Provides the core data: delivery locations (graph vertices), shipments
//! with deadlines and a forward-only lifecycle, and the simulated clock
//! each vehicle carries.

mod clock;
mod location;
mod shipment;

pub use clock::SimClock;
pub use location::{Location, LocationId};
pub use shipment::{Shipment, ShipmentId, ShipmentStatus, END_OF_DAY};
