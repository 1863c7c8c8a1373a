//! Mapping shipments onto an optimized route.

use std::collections::BTreeSet;

use rand::Rng;

use super::{PlannedRoute, RouteOptimizer};
use crate::error::Result;
use crate::graph::LocationGraph;
use crate::models::{LocationId, Shipment, ShipmentId};

/// A route together with the shipments chosen to ride on it.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    /// Stops to visit after leaving the start location.
    pub route: PlannedRoute,
    /// Shipments whose destinations lie on `route`.
    pub shipments: Vec<ShipmentId>,
}

impl RoutePlan {
    /// A plan with no stops and no shipments.
    pub fn empty() -> Self {
        Self {
            route: PlannedRoute::empty(),
            shipments: Vec::new(),
        }
    }
}

/// Ids of shipments in `pool` whose destination is one of `stops`, in pool
/// order, at most `limit` of them.
pub fn match_shipments(stops: &[LocationId], pool: &[&Shipment], limit: usize) -> Vec<ShipmentId> {
    pool.iter()
        .filter(|s| stops.contains(&s.destination()))
        .map(|s| s.id())
        .take(limit)
        .collect()
}

/// Plans a route through the destinations of `pool` and picks the
/// shipments to load.
///
/// When more shipments match the route than `limit` allows, the route is
/// walked stop by stop and cut after the stop that fills the load.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use u_dispatch::graph::LocationGraph;
/// use u_dispatch::models::{Location, Shipment};
/// use u_dispatch::optimizer::{plan_route, RouteOptimizer};
///
/// let mut g = LocationGraph::new();
/// let hub = g.add_location(Location::new("Hub")).unwrap();
/// let a = g.add_location(Location::new("A")).unwrap();
/// g.add_edge(hub, a, 2.0).unwrap();
///
/// let t = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
/// let parcels = vec![Shipment::new(1, a, None, t), Shipment::new(2, a, None, t)];
/// let pool: Vec<&Shipment> = parcels.iter().collect();
///
/// let mut optimizer = RouteOptimizer::with_seed(1, 10);
/// let plan = plan_route(&mut optimizer, &g, &pool, hub, 16, 16).unwrap();
/// assert_eq!(plan.route.stops(), &[a]);
/// assert_eq!(plan.shipments, vec![1, 2]);
/// ```
pub fn plan_route<R: Rng>(
    optimizer: &mut RouteOptimizer<R>,
    graph: &LocationGraph,
    pool: &[&Shipment],
    start: LocationId,
    max_stops: usize,
    limit: usize,
) -> Result<RoutePlan> {
    if pool.is_empty() || limit == 0 {
        return Ok(RoutePlan::empty());
    }

    let candidates: BTreeSet<LocationId> = pool.iter().map(|s| s.destination()).collect();
    let route = optimizer.optimize(graph, &candidates, start, max_stops)?;
    let matched = match_shipments(route.stops(), pool, usize::MAX);
    if matched.len() <= limit {
        return Ok(RoutePlan {
            route,
            shipments: matched,
        });
    }

    let mut shipments = Vec::with_capacity(limit);
    let mut kept = 0;
    for &stop in route.stops() {
        if shipments.len() >= limit {
            break;
        }
        let room = limit - shipments.len();
        shipments.extend(match_shipments(&[stop], pool, room));
        kept += 1;
    }
    let route = route.prefix(graph, start, kept)?;
    Ok(RoutePlan { route, shipments })
}
