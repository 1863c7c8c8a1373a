//! Fleet reporting: mileage, status snapshots and delivery violations.

mod fleet;
mod violation;

pub use fleet::{FleetReport, StatusCounts, VehicleTotals};
pub use violation::{Violation, ViolationType};
