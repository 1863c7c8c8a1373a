//! Delivery violations found in a finished day.

use std::fmt;

use chrono::NaiveTime;

use crate::models::{ShipmentId, ShipmentStatus};

/// A type of violation in a dispatched day.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationType {
    /// Delivered after the shipment's deadline.
    LateDelivery {
        /// Shipment delivered late.
        shipment_id: ShipmentId,
        /// Actual delivery time.
        delivered: NaiveTime,
        /// Deadline that was missed.
        deadline: NaiveTime,
    },
    /// Never delivered.
    Undelivered {
        /// Shipment left behind.
        shipment_id: ShipmentId,
        /// Status it was left in.
        status: ShipmentStatus,
    },
}

/// A violation in a dispatched day.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// The type of violation.
    pub kind: ViolationType,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationType) -> Self {
        Self { kind }
    }

    /// Shipment the violation concerns.
    pub fn shipment_id(&self) -> ShipmentId {
        match self.kind {
            ViolationType::LateDelivery { shipment_id, .. }
            | ViolationType::Undelivered { shipment_id, .. } => shipment_id,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationType::LateDelivery {
                shipment_id,
                delivered,
                deadline,
            } => write!(
                f,
                "shipment {shipment_id} delivered at {delivered}, due {deadline}"
            ),
            ViolationType::Undelivered {
                shipment_id,
                status,
            } => write!(f, "shipment {shipment_id} not delivered ({status})"),
        }
    }
}
