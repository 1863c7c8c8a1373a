//! Constraint resolution.
//!
//! Turns loader-supplied shipment ids (grouping, vehicle affinity, delayed
//! arrival, pending address correction) into read-only sets that dispatch
//! selects against with set difference and union.

mod resolver;

pub use resolver::{ConstraintSets, ConstraintSpec};
