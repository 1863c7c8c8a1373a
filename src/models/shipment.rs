//! Shipment type and its delivery lifecycle.

use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::LocationId;
use crate::error::{Result, RoutingError};
use crate::store::TableEntry;

/// Positive integer shipment identifier.
pub type ShipmentId = u32;

/// Deadline applied when the loader supplies none ("EOD").
pub const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_opt(18, 0, 0) {
    Some(t) => t,
    None => NaiveTime::MIN,
};

/// Lifecycle status. Transitions only move forward:
/// `AtHub → InTransit → Delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShipmentStatus {
    /// Waiting at the hub.
    AtHub,
    /// Loaded on a vehicle.
    InTransit,
    /// Handed over at the destination.
    Delivered,
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AtHub => "at hub",
            Self::InTransit => "in transit",
            Self::Delivered => "delivered",
        };
        f.write_str(s)
    }
}

/// A shipment to be delivered to a graph location.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use u_dispatch::models::{LocationId, Shipment, ShipmentStatus};
///
/// let opening = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
/// let mut s = Shipment::new(1, LocationId(3), None, opening).with_weight(21.0);
/// assert_eq!(s.status(), ShipmentStatus::AtHub);
///
/// let departed = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
/// s.mark_in_transit(departed).unwrap();
/// assert_eq!(s.transit_time(), Some(departed));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    id: ShipmentId,
    destination: LocationId,
    city: String,
    state: String,
    postal_code: String,
    deadline: NaiveTime,
    weight: f64,
    notes: String,
    status: ShipmentStatus,
    status_time: NaiveTime,
    hub_time: Option<NaiveTime>,
    transit_time: Option<NaiveTime>,
    delivery_time: Option<NaiveTime>,
    delivered_by: Option<String>,
}

impl Shipment {
    /// Creates a shipment placed at the hub at `hub_time`.
    ///
    /// A missing deadline means end of day ([`END_OF_DAY`]).
    pub fn new(
        id: ShipmentId,
        destination: LocationId,
        deadline: Option<NaiveTime>,
        hub_time: NaiveTime,
    ) -> Self {
        Self {
            id,
            destination,
            city: String::new(),
            state: String::new(),
            postal_code: String::new(),
            deadline: deadline.unwrap_or(END_OF_DAY),
            weight: 0.0,
            notes: String::new(),
            status: ShipmentStatus::AtHub,
            status_time: hub_time,
            hub_time: Some(hub_time),
            transit_time: None,
            delivery_time: None,
            delivered_by: None,
        }
    }

    /// Sets city, state, and postal code.
    pub fn with_region(
        mut self,
        city: impl Into<String>,
        state: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        self.city = city.into();
        self.state = state.into();
        self.postal_code = postal_code.into();
        self
    }

    /// Sets the weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Sets free-text handling notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn id(&self) -> ShipmentId {
        self.id
    }

    pub fn destination(&self) -> LocationId {
        self.destination
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    pub fn deadline(&self) -> NaiveTime {
        self.deadline
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Current lifecycle status.
    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    /// Time of the last status change.
    pub fn status_time(&self) -> NaiveTime {
        self.status_time
    }

    pub fn hub_time(&self) -> Option<NaiveTime> {
        self.hub_time
    }

    pub fn transit_time(&self) -> Option<NaiveTime> {
        self.transit_time
    }

    pub fn delivery_time(&self) -> Option<NaiveTime> {
        self.delivery_time
    }

    /// Name of the vehicle that delivered this shipment.
    pub fn delivered_by(&self) -> Option<&str> {
        self.delivered_by.as_deref()
    }

    /// Returns `true` once the shipment has been delivered after its deadline.
    pub fn is_late(&self) -> bool {
        self.delivery_time.is_some_and(|t| t > self.deadline)
    }

    /// Moves the shipment from the hub onto a vehicle.
    pub fn mark_in_transit(&mut self, time: NaiveTime) -> Result<()> {
        self.transition(ShipmentStatus::AtHub, ShipmentStatus::InTransit)?;
        self.status_time = time;
        self.transit_time = Some(time);
        Ok(())
    }

    /// Records delivery by `vehicle` at `time`.
    pub fn mark_delivered(&mut self, time: NaiveTime, vehicle: &str) -> Result<()> {
        self.transition(ShipmentStatus::InTransit, ShipmentStatus::Delivered)?;
        self.status_time = time;
        self.delivery_time = Some(time);
        self.delivered_by = Some(vehicle.to_string());
        Ok(())
    }

    /// Points a shipment that is still at the hub to a corrected destination.
    pub fn correct_destination(&mut self, destination: LocationId) -> Result<()> {
        if self.status != ShipmentStatus::AtHub {
            return Err(RoutingError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: ShipmentStatus::AtHub,
            });
        }
        self.destination = destination;
        Ok(())
    }

    /// Status as it stood at `time`, reconstructed from the timestamps.
    pub fn status_at(&self, time: NaiveTime) -> ShipmentStatus {
        match (self.transit_time, self.delivery_time) {
            (_, Some(delivered)) if delivered <= time => ShipmentStatus::Delivered,
            (Some(departed), _) if departed <= time => ShipmentStatus::InTransit,
            _ => ShipmentStatus::AtHub,
        }
    }

    fn transition(&mut self, expected: ShipmentStatus, next: ShipmentStatus) -> Result<()> {
        if self.status != expected {
            return Err(RoutingError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

impl TableEntry for Shipment {
    fn key(&self) -> u64 {
        u64::from(self.id)
    }
}

impl fmt::Display for Shipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Shipment {} to {} ({}, due {})",
            self.id,
            self.destination,
            self.status,
            self.deadline.format("%H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    fn sample() -> Shipment {
        Shipment::new(9, LocationId(2), Some(at(10, 30)), at(8, 0))
            .with_region("Salt Lake City", "UT", "84115")
            .with_weight(2.0)
            .with_notes("Wrong address listed")
    }

    #[test]
    fn test_new_defaults() {
        let s = Shipment::new(1, LocationId(0), None, at(8, 0));
        assert_eq!(s.deadline(), END_OF_DAY);
        assert_eq!(s.status(), ShipmentStatus::AtHub);
        assert_eq!(s.status_time(), at(8, 0));
        assert_eq!(s.hub_time(), Some(at(8, 0)));
        assert!(s.transit_time().is_none());
        assert!(s.delivered_by().is_none());
        assert_eq!(s.key(), 1);
    }

    #[test]
    fn test_builder_fields() {
        let s = sample();
        assert_eq!(s.city(), "Salt Lake City");
        assert_eq!(s.state(), "UT");
        assert_eq!(s.postal_code(), "84115");
        assert_eq!(s.weight(), 2.0);
        assert_eq!(s.notes(), "Wrong address listed");
    }

    #[test]
    fn test_forward_lifecycle() {
        let mut s = sample();
        s.mark_in_transit(at(9, 0)).expect("at hub");
        assert_eq!(s.status(), ShipmentStatus::InTransit);
        s.mark_delivered(at(9, 40), "Truck 2").expect("in transit");
        assert_eq!(s.status(), ShipmentStatus::Delivered);
        assert_eq!(s.status_time(), at(9, 40));
        assert_eq!(s.delivery_time(), Some(at(9, 40)));
        assert_eq!(s.delivered_by(), Some("Truck 2"));
        assert!(!s.is_late());
    }

    #[test]
    fn test_backward_transitions_rejected() {
        let mut s = sample();
        assert!(matches!(
            s.mark_delivered(at(9, 0), "Truck 1"),
            Err(RoutingError::InvalidTransition { id: 9, .. })
        ));
        s.mark_in_transit(at(9, 0)).expect("at hub");
        assert!(s.mark_in_transit(at(9, 5)).is_err());
        assert!(s.correct_destination(LocationId(5)).is_err());
        assert_eq!(s.transit_time(), Some(at(9, 0)));
    }

    #[test]
    fn test_correct_destination_at_hub() {
        let mut s = sample();
        s.correct_destination(LocationId(7)).expect("at hub");
        assert_eq!(s.destination(), LocationId(7));
    }

    #[test]
    fn test_status_at() {
        let mut s = sample();
        assert_eq!(s.status_at(at(12, 0)), ShipmentStatus::AtHub);
        s.mark_in_transit(at(9, 0)).expect("at hub");
        s.mark_delivered(at(11, 0), "Truck 1").expect("in transit");
        assert_eq!(s.status_at(at(8, 30)), ShipmentStatus::AtHub);
        assert_eq!(s.status_at(at(9, 0)), ShipmentStatus::InTransit);
        assert_eq!(s.status_at(at(10, 59)), ShipmentStatus::InTransit);
        assert_eq!(s.status_at(at(11, 0)), ShipmentStatus::Delivered);
        assert!(s.is_late());
    }
}
