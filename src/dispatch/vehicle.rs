//! Vehicle state machine with its own simulated clock.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveTime;

use crate::config::EngineConfig;
use crate::error::{Result, RoutingError};
use crate::models::{LocationId, ShipmentId, ShipmentStatus, SimClock};
use crate::store::ShipmentTable;

/// Dispatch state of a vehicle.
///
/// `Idle → Loaded → EnRoute → AtStop (loop) → Returning → Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleState {
    /// At the hub with nothing assigned.
    Idle,
    /// Shipments loaded, not yet departed.
    Loaded,
    /// Travelling between stops.
    EnRoute,
    /// Arrived at a stop.
    AtStop,
    /// Travelling back to the hub.
    Returning,
}

impl fmt::Display for VehicleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Loaded => "loaded",
            Self::EnRoute => "en route",
            Self::AtStop => "at a stop",
            Self::Returning => "returning",
        };
        f.write_str(s)
    }
}

/// A delivery vehicle with limited capacity.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use u_dispatch::dispatch::{Vehicle, VehicleState};
/// use u_dispatch::models::LocationId;
///
/// let start = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
/// let truck = Vehicle::new("Truck 1", LocationId(0), start);
/// assert_eq!(truck.capacity(), 16);
/// assert_eq!(truck.state(), VehicleState::Idle);
/// assert_eq!(truck.current(), truck.hub());
/// ```
#[derive(Debug, Clone)]
pub struct Vehicle {
    name: String,
    hub: LocationId,
    current: LocationId,
    carried: BTreeSet<ShipmentId>,
    capacity: usize,
    trip_distance: f64,
    total_distance: f64,
    last_load_size: Option<usize>,
    clock: SimClock,
    state: VehicleState,
}

impl Vehicle {
    /// Shipments a vehicle carries unless configured otherwise.
    pub const DEFAULT_CAPACITY: usize = 16;

    /// Average speed (distance units per hour) unless configured otherwise.
    pub const DEFAULT_SPEED: f64 = SimClock::DEFAULT_SPEED;

    /// Creates an idle vehicle at `hub` whose clock starts at `start`.
    pub fn new(name: impl Into<String>, hub: LocationId, start: NaiveTime) -> Self {
        Self {
            name: name.into(),
            hub,
            current: hub,
            carried: BTreeSet::new(),
            capacity: Self::DEFAULT_CAPACITY,
            trip_distance: 0.0,
            total_distance: 0.0,
            last_load_size: None,
            clock: SimClock::start(start),
            state: VehicleState::Idle,
        }
    }

    /// Creates a vehicle with capacity and speed taken from `config`.
    ///
    /// Fails with [`RoutingError::InvalidSpeed`] if the configured speed is
    /// not finite and positive.
    pub fn from_config(
        name: impl Into<String>,
        hub: LocationId,
        start: NaiveTime,
        config: &EngineConfig,
    ) -> Result<Self> {
        Self::new(name, hub, start)
            .with_capacity(config.vehicle_capacity)
            .with_speed(config.average_speed)
    }

    /// Sets the capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the average speed; it must be finite and positive.
    pub fn with_speed(mut self, speed: f64) -> Result<Self> {
        self.clock = SimClock::new(self.clock.now(), speed)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hub(&self) -> LocationId {
        self.hub
    }

    /// Location the vehicle is at (or last left).
    pub fn current(&self) -> LocationId {
        self.current
    }

    /// Shipments currently on board.
    pub fn carried(&self) -> &BTreeSet<ShipmentId> {
        &self.carried
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free places on board.
    pub fn room(&self) -> usize {
        self.capacity.saturating_sub(self.carried.len())
    }

    /// Distance driven on the current (or last) trip.
    pub fn trip_distance(&self) -> f64 {
        self.trip_distance
    }

    /// Distance driven over all completed trips.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Number of shipments on board after the last load.
    pub fn last_load_size(&self) -> Option<usize> {
        self.last_load_size
    }

    /// Current simulated time.
    pub fn time(&self) -> NaiveTime {
        self.clock.now()
    }

    pub fn state(&self) -> VehicleState {
        self.state
    }

    /// Loads shipments, marking each in transit at the vehicle's time.
    ///
    /// Nothing changes if the load fails: overload, unknown ids, and
    /// shipments not at the hub are all checked before any shipment moves.
    pub fn load(&mut self, ids: &[ShipmentId], store: &mut ShipmentTable) -> Result<()> {
        if !matches!(self.state, VehicleState::Idle | VehicleState::Loaded) {
            return Err(self.invalid_state("load"));
        }

        let incoming: BTreeSet<ShipmentId> = ids
            .iter()
            .copied()
            .filter(|id| !self.carried.contains(id))
            .collect();
        let requested = self.carried.len() + incoming.len();
        if requested > self.capacity {
            return Err(RoutingError::VehicleOverloaded {
                vehicle: self.name.clone(),
                requested,
                capacity: self.capacity,
            });
        }

        for &id in &incoming {
            let shipment = store
                .search(u64::from(id))
                .ok_or(RoutingError::UnknownShipment(id))?;
            if shipment.status() != ShipmentStatus::AtHub {
                return Err(RoutingError::InvalidTransition {
                    id,
                    from: shipment.status(),
                    to: ShipmentStatus::InTransit,
                });
            }
        }

        if self.state == VehicleState::Idle {
            self.trip_distance = 0.0;
            self.current = self.hub;
        }

        let now = self.clock.now();
        for &id in &incoming {
            store
                .search_mut(u64::from(id))
                .ok_or(RoutingError::UnknownShipment(id))?
                .mark_in_transit(now)?;
        }
        self.carried.extend(incoming);
        self.last_load_size = Some(self.carried.len());
        self.state = VehicleState::Loaded;
        Ok(())
    }

    /// Travels `distance` to `stop` and delivers everything addressed there.
    ///
    /// A stop equal to the current location is a no-op and returns `false`.
    pub fn make_stop(
        &mut self,
        stop: LocationId,
        distance: f64,
        store: &mut ShipmentTable,
    ) -> Result<bool> {
        if !matches!(self.state, VehicleState::Loaded | VehicleState::AtStop) {
            return Err(self.invalid_state("travel"));
        }
        if stop == self.current {
            return Ok(false);
        }

        self.state = VehicleState::EnRoute;
        self.travel(stop, distance);
        self.state = VehicleState::AtStop;
        self.deliver(store)?;
        Ok(true)
    }

    /// Drives back to the hub and closes the trip.
    pub fn return_to_hub(&mut self, distance: f64) -> Result<()> {
        if !matches!(self.state, VehicleState::Loaded | VehicleState::AtStop) {
            return Err(self.invalid_state("return"));
        }
        self.state = VehicleState::Returning;
        if self.current != self.hub {
            self.travel(self.hub, distance);
        }
        self.total_distance += self.trip_distance;
        self.state = VehicleState::Idle;
        Ok(())
    }

    /// Holds an idle vehicle at the hub until `time`. Earlier times are ignored.
    pub fn wait_until(&mut self, time: NaiveTime) -> Result<()> {
        if self.state != VehicleState::Idle {
            return Err(self.invalid_state("wait"));
        }
        if time > self.clock.now() {
            self.clock.advance(time - self.clock.now());
        }
        Ok(())
    }

    fn travel(&mut self, to: LocationId, distance: f64) {
        self.clock.advance_distance(distance);
        self.trip_distance += distance;
        self.current = to;
    }

    /// Hands over every carried shipment addressed to the current location.
    fn deliver(&mut self, store: &mut ShipmentTable) -> Result<Vec<ShipmentId>> {
        let mut here = Vec::new();
        for &id in &self.carried {
            let shipment = store
                .search(u64::from(id))
                .ok_or(RoutingError::UnknownShipment(id))?;
            if shipment.destination() == self.current {
                here.push(id);
            }
        }

        let now = self.clock.now();
        for &id in &here {
            store
                .search_mut(u64::from(id))
                .ok_or(RoutingError::UnknownShipment(id))?
                .mark_delivered(now, &self.name)?;
            self.carried.remove(&id);
            tracing::debug!(vehicle = %self.name, shipment = id, at = %now, "delivered");
        }
        Ok(here)
    }

    fn invalid_state(&self, operation: &'static str) -> RoutingError {
        RoutingError::InvalidVehicleState {
            vehicle: self.name.clone(),
            operation,
            state: self.state.to_string(),
        }
    }
}
