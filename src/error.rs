//! Error type shared by every fallible engine operation.
//!
//! Absence is not an error here: lookups that can legitimately miss
//! (table search, path reconstruction, constraint ids) return `Option`.

use crate::models::{LocationId, ShipmentId, ShipmentStatus};

/// Errors raised by graph, store, and dispatch operations.
///
/// Structural variants signal a caller or data bug and abort the operation.
/// Capacity variants are surfaced so the caller can pick a smaller load or
/// a larger table. Nothing is retried internally.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoutingError {
    /// A location address was registered twice.
    #[error("location `{0}` is already registered")]
    DuplicateLocation(String),

    /// A location id does not belong to the graph.
    #[error("location {0} is not registered in the graph")]
    UnknownLocation(LocationId),

    /// Two locations are not direct neighbors.
    #[error("no edge between locations {from} and {to}")]
    MissingEdge {
        /// Origin of the lookup.
        from: LocationId,
        /// Destination of the lookup.
        to: LocationId,
    },

    /// Edge weights must be finite and strictly positive.
    #[error("invalid edge distance {0}")]
    InvalidDistance(f64),

    /// A shipment id is absent from the store.
    #[error("shipment {0} not found")]
    UnknownShipment(ShipmentId),

    /// A shipment status change that would move backwards or skip a step.
    #[error("shipment {id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        /// Shipment id.
        id: ShipmentId,
        /// Current status.
        from: ShipmentStatus,
        /// Requested status.
        to: ShipmentStatus,
    },

    /// A vehicle operation was requested in a state that does not allow it.
    #[error("vehicle `{vehicle}` cannot {operation} while {state}")]
    InvalidVehicleState {
        /// Vehicle name.
        vehicle: String,
        /// Operation that was attempted.
        operation: &'static str,
        /// State the vehicle was in.
        state: String,
    },

    /// Carried shipments whose destinations never appear on the route.
    #[error("shipments {0:?} cannot be delivered on the given route")]
    UndeliverableShipments(Vec<ShipmentId>),

    /// Vehicle speed must be finite and strictly positive.
    #[error("invalid average speed {0}")]
    InvalidSpeed(f64),

    /// Every probed bucket was occupied.
    #[error("hash table full at capacity {capacity}")]
    TableFull {
        /// Bucket count at the time of the failure.
        capacity: usize,
    },

    /// A load would exceed the vehicle's capacity.
    #[error("vehicle `{vehicle}` cannot carry {requested} shipments (capacity {capacity})")]
    VehicleOverloaded {
        /// Vehicle name.
        vehicle: String,
        /// Carried plus newly requested shipments.
        requested: usize,
        /// Capacity limit.
        capacity: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RoutingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = RoutingError::MissingEdge {
            from: LocationId(1),
            to: LocationId(4),
        };
        assert_eq!(e.to_string(), "no edge between locations #1 and #4");

        let e = RoutingError::VehicleOverloaded {
            vehicle: "Truck 1".into(),
            requested: 17,
            capacity: 16,
        };
        assert_eq!(
            e.to_string(),
            "vehicle `Truck 1` cannot carry 17 shipments (capacity 16)"
        );
    }

    #[test]
    fn test_transition_message() {
        let e = RoutingError::InvalidTransition {
            id: 7,
            from: ShipmentStatus::Delivered,
            to: ShipmentStatus::InTransit,
        };
        assert!(e.to_string().contains("shipment 7"));
    }
}
