//! Wave-based dispatch of vehicles over the location graph.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveTime;
use rand::Rng;

use super::{Vehicle, VehicleState};
use crate::config::EngineConfig;
use crate::constraints::{ConstraintSets, ConstraintSpec};
use crate::error::{Result, RoutingError};
use crate::graph::LocationGraph;
use crate::models::{LocationId, Shipment, ShipmentId, ShipmentStatus};
use crate::optimizer::{plan_route, RouteOptimizer};
use crate::pathfinding::ShortestPaths;
use crate::store::ShipmentTable;

/// Dispatch waves, in the order a day is usually worked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wave {
    /// Shipments due before the priority cutoff, excluding delayed ones.
    Priority,
    /// Priority shipments plus released delayed shipments plus shipments
    /// pinned to the dispatched vehicle.
    Constrained,
    /// Everything still eligible.
    Standard,
}

impl fmt::Display for Wave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Priority => "priority",
            Self::Constrained => "constrained",
            Self::Standard => "standard",
        };
        f.write_str(s)
    }
}

/// Outcome of one dispatched trip.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSummary {
    /// Vehicle that drove the trip.
    pub vehicle: String,
    /// Route as driven, excluding the hub at either end.
    pub stops: Vec<LocationId>,
    /// Delivered shipments, in load order.
    pub delivered: Vec<ShipmentId>,
    /// Trip distance including the return leg.
    pub distance: f64,
    pub departed: NaiveTime,
    pub returned: NaiveTime,
    /// Eligible shipments left at the hub because no route reaches them.
    pub unroutable: Vec<ShipmentId>,
}

impl DispatchSummary {
    fn idle(vehicle: &Vehicle) -> Self {
        Self {
            vehicle: vehicle.name().to_string(),
            stops: Vec::new(),
            delivered: Vec::new(),
            distance: 0.0,
            departed: vehicle.time(),
            returned: vehicle.time(),
            unroutable: Vec::new(),
        }
    }

    /// Returns `true` if nothing was loaded.
    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }
}

/// Owns the graph, the shipment store and the constraint sets, and drives
/// vehicles through load, delivery and return.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use u_dispatch::config::EngineConfig;
/// use u_dispatch::constraints::ConstraintSpec;
/// use u_dispatch::dispatch::DeliveryEngine;
/// use u_dispatch::graph::LocationGraph;
/// use u_dispatch::models::{Location, Shipment, ShipmentStatus};
///
/// let mut g = LocationGraph::new();
/// let hub = g.add_location(Location::new("Hub")).unwrap();
/// let a = g.add_location(Location::new("A")).unwrap();
/// let b = g.add_location(Location::new("B")).unwrap();
/// g.add_edge(hub, a, 5.0).unwrap();
/// g.add_edge(hub, b, 3.0).unwrap();
/// g.add_edge(a, b, 2.0).unwrap();
///
/// let config = EngineConfig::default();
/// let opening = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
/// let mut store = config.shipment_table();
/// store.insert(Shipment::new(1, b, None, opening)).unwrap();
///
/// let mut engine =
///     DeliveryEngine::new(g, store, &ConstraintSpec::default(), config, hub).unwrap();
/// let mut truck = engine.vehicle("Truck 1", opening).unwrap();
/// let trip = engine.dispatch_route(&mut truck, &[b], &[1]).unwrap();
///
/// assert_eq!(trip.distance, 6.0);
/// assert_eq!(engine.shipment(1).unwrap().status(), ShipmentStatus::Delivered);
/// ```
#[derive(Debug, Clone)]
pub struct DeliveryEngine {
    graph: LocationGraph,
    store: ShipmentTable,
    constraints: ConstraintSets,
    config: EngineConfig,
    hub: LocationId,
    corrected: BTreeSet<ShipmentId>,
}

impl DeliveryEngine {
    /// Creates an engine; constraint ids are resolved against `store`.
    pub fn new(
        graph: LocationGraph,
        store: ShipmentTable,
        constraints: &ConstraintSpec,
        config: EngineConfig,
        hub: LocationId,
    ) -> Result<Self> {
        config.validate()?;
        if !graph.contains(hub) {
            return Err(RoutingError::UnknownLocation(hub));
        }
        for shipment in store.all() {
            if !graph.contains(shipment.destination()) {
                return Err(RoutingError::UnknownLocation(shipment.destination()));
            }
        }
        let constraints = ConstraintSets::resolve(constraints, &store);
        Ok(Self {
            graph,
            store,
            constraints,
            config,
            hub,
            corrected: BTreeSet::new(),
        })
    }

    pub fn graph(&self) -> &LocationGraph {
        &self.graph
    }

    pub fn store(&self) -> &ShipmentTable {
        &self.store
    }

    pub fn constraints(&self) -> &ConstraintSets {
        &self.constraints
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn hub(&self) -> LocationId {
        self.hub
    }

    pub fn shipment(&self, id: ShipmentId) -> Option<&Shipment> {
        self.store.search(u64::from(id))
    }

    /// Shipments still waiting at the hub, by id.
    pub fn remaining(&self) -> Vec<ShipmentId> {
        let mut ids: Vec<ShipmentId> = self
            .store
            .filter(|s| s.status() == ShipmentStatus::AtHub)
            .into_iter()
            .map(Shipment::id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// A vehicle parked at the hub, sized and timed per the engine config.
    pub fn vehicle(&self, name: impl Into<String>, start: NaiveTime) -> Result<Vehicle> {
        Vehicle::from_config(name, self.hub, start, &self.config)
    }

    /// Applies an address correction and releases the shipment for routing.
    pub fn correct_destination(&mut self, id: ShipmentId, destination: LocationId) -> Result<()> {
        if !self.graph.contains(destination) {
            return Err(RoutingError::UnknownLocation(destination));
        }
        self.store
            .search_mut(u64::from(id))
            .ok_or(RoutingError::UnknownShipment(id))?
            .correct_destination(destination)?;
        self.corrected.insert(id);
        tracing::info!(shipment = id, %destination, "destination corrected");
        Ok(())
    }

    /// Loads `shipments` and drives `route` until every one is delivered,
    /// then returns to the hub.
    ///
    /// The whole trip is checked before anything is loaded: every leg and
    /// the way home must exist, and every shipment on board must be
    /// addressed to a stop the vehicle actually travels to. A shipment
    /// addressed to the vehicle's starting point fails that check. Failures
    /// are [`RoutingError::UndeliverableShipments`] or
    /// [`RoutingError::MissingEdge`] and leave the vehicle and the store
    /// untouched.
    ///
    /// Legs between locations that are not direct neighbors are charged
    /// the shortest-path distance over the full graph.
    pub fn dispatch_route(
        &mut self,
        vehicle: &mut Vehicle,
        route: &[LocationId],
        shipments: &[ShipmentId],
    ) -> Result<DispatchSummary> {
        self.check_trip(vehicle, route, shipments)?;

        let departed = vehicle.time();
        vehicle.load(shipments, &mut self.store)?;
        let loaded: Vec<ShipmentId> = vehicle.carried().iter().copied().collect();

        let mut driven = Vec::new();
        while !vehicle.carried().is_empty() {
            let before = vehicle.carried().len();
            for &stop in route {
                if vehicle.carried().is_empty() {
                    break;
                }
                let distance = self.leg(vehicle.current(), stop)?;
                if vehicle.make_stop(stop, distance, &mut self.store)? {
                    driven.push(stop);
                }
            }
            if vehicle.carried().len() == before {
                return Err(RoutingError::UndeliverableShipments(
                    vehicle.carried().iter().copied().collect(),
                ));
            }
        }

        let distance = self.leg(vehicle.current(), vehicle.hub())?;
        vehicle.return_to_hub(distance)?;

        Ok(DispatchSummary {
            vehicle: vehicle.name().to_string(),
            stops: driven,
            delivered: loaded,
            distance: vehicle.trip_distance(),
            departed,
            returned: vehicle.time(),
            unroutable: Vec::new(),
        })
    }

    /// Walks `route` the way [`Vehicle::make_stop`] will and rejects trips
    /// that cannot complete.
    fn check_trip(
        &self,
        vehicle: &Vehicle,
        route: &[LocationId],
        shipments: &[ShipmentId],
    ) -> Result<()> {
        let mut position = if vehicle.state() == VehicleState::Idle {
            vehicle.hub()
        } else {
            vehicle.current()
        };
        let mut visited = BTreeSet::new();
        for &stop in route {
            if stop == position {
                continue;
            }
            self.leg(position, stop)?;
            visited.insert(stop);
            position = stop;
        }
        self.leg(position, vehicle.hub())?;

        let mut undeliverable = Vec::new();
        let on_board: BTreeSet<ShipmentId> =
            shipments.iter().chain(vehicle.carried()).copied().collect();
        for id in on_board {
            let shipment = self.shipment(id).ok_or(RoutingError::UnknownShipment(id))?;
            if !visited.contains(&shipment.destination()) {
                undeliverable.push(id);
            }
        }
        if !undeliverable.is_empty() {
            return Err(RoutingError::UndeliverableShipments(undeliverable));
        }
        Ok(())
    }

    /// Travel distance between two locations: the edge weight for
    /// neighbors, otherwise the shortest path over the whole graph.
    fn leg(&self, from: LocationId, to: LocationId) -> Result<f64> {
        if from == to {
            return Ok(0.0);
        }
        if let Some(distance) = self.graph.edge_weight(from, to) {
            return Ok(distance);
        }
        ShortestPaths::compute(&self.graph, from, self.graph.ids())?
            .distance_to(to)
            .ok_or(RoutingError::MissingEdge { from, to })
    }

    /// Shipments `vehicle` may take in `wave` at its current time.
    ///
    /// Shipments pinned to other vehicles and uncorrected addresses are
    /// never eligible.
    pub fn eligible(&self, wave: Wave, vehicle: &Vehicle) -> BTreeSet<ShipmentId> {
        let now = vehicle.time();
        let excluded = self.constraints.excluded_for(vehicle.name());
        let pinned = self.constraints.affinity(vehicle.name());
        let delayed = self.constraints.delayed();
        let released = self.constraints.delayed_released(now);
        let cutoff = self.config.priority_cutoff;

        self.store
            .filter(|s| s.status() == ShipmentStatus::AtHub)
            .into_iter()
            .filter(|s| !excluded.contains(&s.id()) && !self.awaiting_correction(s.id()))
            .filter(|s| {
                let id = s.id();
                let urgent = s.deadline() < cutoff && !delayed.contains(&id);
                match wave {
                    Wave::Priority => urgent,
                    Wave::Constrained => {
                        urgent || (delayed.contains(&id) && released) || pinned.contains(&id)
                    }
                    Wave::Standard => !delayed.contains(&id) || released,
                }
            })
            .map(Shipment::id)
            .collect()
    }

    /// Plans and drives one trip for `vehicle` over the shipments eligible
    /// in `wave`.
    ///
    /// Grouped shipments travel together or not at all. Further eligible
    /// shipments whose destination is already on the route are topped up
    /// to capacity. Eligible shipments no route can reach stay at the hub
    /// and are listed in [`DispatchSummary::unroutable`].
    pub fn dispatch_wave<R: Rng>(
        &mut self,
        vehicle: &mut Vehicle,
        wave: Wave,
        optimizer: &mut RouteOptimizer<R>,
    ) -> Result<DispatchSummary> {
        let (route, selection, unroutable) = self.plan_wave(vehicle, wave, optimizer)?;
        if !unroutable.is_empty() {
            tracing::warn!(vehicle = vehicle.name(), %wave, ?unroutable, "no route reaches shipments");
        }
        if selection.is_empty() {
            tracing::info!(vehicle = vehicle.name(), %wave, "nothing to dispatch");
            let mut summary = DispatchSummary::idle(vehicle);
            summary.unroutable = unroutable;
            return Ok(summary);
        }

        let mut summary = self.dispatch_route(vehicle, &route, &selection)?;
        summary.unroutable = unroutable;
        tracing::info!(
            vehicle = vehicle.name(),
            %wave,
            shipments = summary.delivered.len(),
            distance = summary.distance,
            departed = %summary.departed,
            returned = %summary.returned,
            "wave dispatched"
        );
        Ok(summary)
    }

    fn plan_wave<R: Rng>(
        &self,
        vehicle: &Vehicle,
        wave: Wave,
        optimizer: &mut RouteOptimizer<R>,
    ) -> Result<(Vec<LocationId>, Vec<ShipmentId>, Vec<ShipmentId>)> {
        let start = vehicle.current();
        let eligible = self.eligible(wave, vehicle);
        let (pool, mut unroutable): (Vec<&Shipment>, Vec<&Shipment>) = eligible
            .iter()
            .filter_map(|&id| self.shipment(id))
            .partition(|s| s.destination() != start);
        let room = vehicle.room();

        let plan = plan_route(
            optimizer,
            &self.graph,
            &pool,
            start,
            self.config.max_stops,
            room,
        )?;
        let mut selection: BTreeSet<ShipmentId> = plan.shipments.into_iter().collect();

        for shipment in &pool {
            if selection.len() >= room {
                break;
            }
            if plan.route.contains(shipment.destination()) {
                selection.insert(shipment.id());
            }
        }
        self.close_groups(vehicle, &eligible, &mut selection, room);

        let mut stops = plan.route.into_stops();
        let mut stranded = Vec::new();
        for &id in &selection {
            let Some(destination) = self.shipment(id).map(Shipment::destination) else {
                continue;
            };
            if destination == start {
                stranded.push(id);
                continue;
            }
            if stops.contains(&destination) {
                continue;
            }
            let from = stops.last().copied().unwrap_or(start);
            let paths = ShortestPaths::compute(&self.graph, from, self.graph.ids())?;
            match paths.reconstruct(destination) {
                Some(path) => stops.extend(path.stops().iter().skip(1).copied()),
                None => stranded.push(id),
            }
        }
        if stranded.iter().any(|id| self.constraints.grouped().contains(id)) {
            selection.retain(|id| !self.constraints.grouped().contains(id));
        }
        for id in &stranded {
            selection.remove(id);
        }

        // Pool shipments the candidate-bounded search cannot reach from the
        // start were dropped by the optimizer.
        let candidates: BTreeSet<LocationId> = pool.iter().map(|s| s.destination()).collect();
        let reach = ShortestPaths::compute(&self.graph, start, candidates)?;
        unroutable.extend(pool.iter().copied().filter(|s| {
            !selection.contains(&s.id()) && reach.distance_to(s.destination()).is_none()
        }));
        let mut unroutable: Vec<ShipmentId> = unroutable
            .into_iter()
            .map(Shipment::id)
            .filter(|id| !selection.contains(id))
            .chain(stranded.into_iter().filter(|id| !selection.contains(id)))
            .collect();
        unroutable.sort_unstable();
        unroutable.dedup();

        Ok((stops, selection.into_iter().collect(), unroutable))
    }

    /// Adds the rest of a group once any member is selected, or drops the
    /// whole group if its members cannot all ride now.
    fn close_groups(
        &self,
        vehicle: &Vehicle,
        eligible: &BTreeSet<ShipmentId>,
        selection: &mut BTreeSet<ShipmentId>,
        room: usize,
    ) {
        let grouped = self.constraints.grouped();
        if selection.is_disjoint(grouped) {
            return;
        }

        let members: BTreeSet<ShipmentId> = grouped
            .iter()
            .copied()
            .filter(|&id| {
                self.shipment(id)
                    .is_some_and(|s| s.status() == ShipmentStatus::AtHub)
            })
            .collect();
        let blocked = members.iter().any(|&id| {
            self.awaiting_correction(id)
                || self
                    .constraints
                    .affinity_of(id)
                    .is_some_and(|pinned| pinned != vehicle.name())
                || (self.constraints.delayed().contains(&id)
                    && !self.constraints.delayed_released(vehicle.time()))
        });
        let needed = selection.union(&members).count();

        if blocked || needed > room {
            tracing::debug!(
                vehicle = vehicle.name(),
                needed,
                room,
                blocked,
                "group held back"
            );
            selection.retain(|id| !grouped.contains(id));
        } else {
            let pulled: Vec<ShipmentId> = members.difference(eligible).copied().collect();
            if !pulled.is_empty() {
                tracing::debug!(vehicle = vehicle.name(), ?pulled, "group completed");
            }
            selection.extend(members);
        }
    }

    fn awaiting_correction(&self, id: ShipmentId) -> bool {
        self.constraints.pending_correction().contains(&id) && !self.corrected.contains(&id)
    }
}
