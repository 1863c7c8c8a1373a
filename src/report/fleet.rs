//! End-of-day fleet report.

use std::fmt;

use chrono::NaiveTime;

use super::{Violation, ViolationType};
use crate::dispatch::Vehicle;
use crate::models::{Shipment, ShipmentStatus};
use crate::store::ShipmentTable;

/// Shipment counts per lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub at_hub: usize,
    pub in_transit: usize,
    pub delivered: usize,
}

impl StatusCounts {
    /// Counts current statuses.
    pub fn current(store: &ShipmentTable) -> Self {
        Self::tally(store.all().map(Shipment::status))
    }

    /// Counts statuses as they stood at `time`.
    pub fn at(store: &ShipmentTable, time: NaiveTime) -> Self {
        Self::tally(store.all().map(|s| s.status_at(time)))
    }

    /// Total shipments counted.
    pub fn total(&self) -> usize {
        self.at_hub + self.in_transit + self.delivered
    }

    fn tally(statuses: impl Iterator<Item = ShipmentStatus>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            match status {
                ShipmentStatus::AtHub => counts.at_hub += 1,
                ShipmentStatus::InTransit => counts.in_transit += 1,
                ShipmentStatus::Delivered => counts.delivered += 1,
            }
        }
        counts
    }
}

/// Distance and clock of one vehicle at report time.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleTotals {
    pub name: String,
    pub distance: f64,
    pub time: NaiveTime,
}

/// Summary of a dispatched day: mileage, status counts and violations.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use u_dispatch::dispatch::Vehicle;
/// use u_dispatch::models::{LocationId, Shipment};
/// use u_dispatch::report::FleetReport;
/// use u_dispatch::store::ShipmentTable;
///
/// let opening = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
/// let mut store = ShipmentTable::new();
/// store.insert(Shipment::new(1, LocationId(1), None, opening)).unwrap();
///
/// let report = FleetReport::new(&[Vehicle::new("Truck 1", LocationId(0), opening)], &store);
/// assert_eq!(report.counts.at_hub, 1);
/// assert!(!report.is_complete());
/// assert_eq!(report.violations.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FleetReport {
    /// Distance driven by all vehicles over completed trips.
    pub total_distance: f64,
    pub vehicles: Vec<VehicleTotals>,
    pub counts: StatusCounts,
    /// Late and missing deliveries, by shipment id.
    pub violations: Vec<Violation>,
}

impl FleetReport {
    /// Builds the report from the fleet and the shipment store.
    pub fn new(vehicles: &[Vehicle], store: &ShipmentTable) -> Self {
        let vehicles: Vec<VehicleTotals> = vehicles
            .iter()
            .map(|v| VehicleTotals {
                name: v.name().to_string(),
                distance: v.total_distance(),
                time: v.time(),
            })
            .collect();
        let total_distance = vehicles.iter().map(|v| v.distance).sum();

        let mut shipments: Vec<&Shipment> = store.all().collect();
        shipments.sort_by_key(|s| s.id());
        let violations = shipments
            .into_iter()
            .filter_map(|s| match (s.status(), s.delivery_time()) {
                (ShipmentStatus::Delivered, Some(delivered)) if delivered > s.deadline() => {
                    Some(Violation::new(ViolationType::LateDelivery {
                        shipment_id: s.id(),
                        delivered,
                        deadline: s.deadline(),
                    }))
                }
                (ShipmentStatus::Delivered, _) => None,
                (status, _) => Some(Violation::new(ViolationType::Undelivered {
                    shipment_id: s.id(),
                    status,
                })),
            })
            .collect();

        Self {
            total_distance,
            vehicles,
            counts: StatusCounts::current(store),
            violations,
        }
    }

    /// Returns `true` if every shipment was delivered.
    pub fn is_complete(&self) -> bool {
        self.counts.at_hub == 0 && self.counts.in_transit == 0
    }

    /// Returns `true` if there are no violations.
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }

    /// Late deliveries only.
    pub fn late_deliveries(&self) -> impl Iterator<Item = &Violation> + '_ {
        self.violations
            .iter()
            .filter(|v| matches!(v.kind, ViolationType::LateDelivery { .. }))
    }
}

impl fmt::Display for FleetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for v in &self.vehicles {
            writeln!(f, "{}: {:.1} miles, back at {}", v.name, v.distance, v.time)?;
        }
        writeln!(f, "total: {:.1} miles", self.total_distance)?;
        writeln!(
            f,
            "delivered {}, in transit {}, at hub {}",
            self.counts.delivered, self.counts.in_transit, self.counts.at_hub
        )?;
        for violation in &self.violations {
            writeln!(f, "  {violation}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocationId;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    fn store() -> ShipmentTable {
        let mut table = ShipmentTable::new();
        let on_time = Shipment::new(1, LocationId(1), Some(at(10, 30)), at(8, 0));
        let late = Shipment::new(2, LocationId(1), Some(at(9, 0)), at(8, 0));
        let waiting = Shipment::new(3, LocationId(2), None, at(8, 0));
        for s in [on_time, late, waiting] {
            table.insert(s).expect("room");
        }
        for id in [1, 2] {
            let s = table.search_mut(id).expect("stored");
            s.mark_in_transit(at(8, 0)).expect("at hub");
            s.mark_delivered(at(9, 30), "Truck 1").expect("in transit");
        }
        table
    }

    #[test]
    fn test_status_counts() {
        let s = store();
        assert_eq!(
            StatusCounts::current(&s),
            StatusCounts {
                at_hub: 1,
                in_transit: 0,
                delivered: 2
            }
        );
        let early = StatusCounts::at(&s, at(9, 0));
        assert_eq!(early.in_transit, 2);
        assert_eq!(early.total(), 3);
    }

    #[test]
    fn test_violations() {
        let report = FleetReport::new(&[], &store());
        assert!(!report.is_complete());
        assert!(!report.is_feasible());
        assert_eq!(report.violations.len(), 2);

        let late: Vec<&Violation> = report.late_deliveries().collect();
        assert_eq!(late.len(), 1);
        assert_eq!(
            late[0].kind,
            ViolationType::LateDelivery {
                shipment_id: 2,
                delivered: at(9, 30),
                deadline: at(9, 0),
            }
        );
        assert_eq!(report.violations[1].shipment_id(), 3);
        assert_eq!(
            report.violations[1].to_string(),
            "shipment 3 not delivered (at hub)"
        );
    }

    #[test]
    fn test_vehicle_totals() {
        let fleet = [
            Vehicle::new("Truck 1", LocationId(0), at(8, 0)),
            Vehicle::new("Truck 2", LocationId(0), at(9, 5)),
        ];
        let report = FleetReport::new(&fleet, &store());
        assert_eq!(report.vehicles.len(), 2);
        assert_eq!(report.vehicles[1].time, at(9, 5));
        assert_eq!(report.total_distance, 0.0);
        assert!(report.to_string().contains("total: 0.0 miles"));
    }
}
