//! Randomized greedy multi-restart route construction.
//!
//! Each trial starts at the start location and repeatedly picks a uniformly
//! random remaining candidate as its next waypoint, stitching in the
//! shortest path to it over the remaining candidates. The shortest of all
//! trials is kept.
//!
//! # Complexity
//!
//! O(T · S · C²) for T trials, S waypoints per trial, and C candidates.
//!
//! No optimality guarantee: quality grows with the trial budget at linear
//! cost.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::graph::LocationGraph;
use crate::models::LocationId;
use crate::pathfinding::ShortestPaths;

/// An ordered stop sequence produced by the optimizer.
///
/// The start location is not part of `stops`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    stops: Vec<LocationId>,
    distance: f64,
}

impl PlannedRoute {
    /// A route with no stops.
    pub fn empty() -> Self {
        Self {
            stops: Vec::new(),
            distance: 0.0,
        }
    }

    /// Creates a route from explicit stops and their total distance.
    pub fn new(stops: Vec<LocationId>, distance: f64) -> Self {
        Self { stops, distance }
    }

    /// Stops in visiting order.
    pub fn stops(&self) -> &[LocationId] {
        &self.stops
    }

    /// Total distance from the start through every stop.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Number of stops.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Returns `true` if the route has no stops.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Last stop, if any.
    pub fn last(&self) -> Option<LocationId> {
        self.stops.last().copied()
    }

    /// Returns `true` if `location` is one of the stops.
    pub fn contains(&self, location: LocationId) -> bool {
        self.stops.contains(&location)
    }

    /// The first `len` stops, with the distance recomputed from `start`.
    pub fn prefix(&self, graph: &LocationGraph, start: LocationId, len: usize) -> Result<Self> {
        let stops: Vec<LocationId> = self.stops.iter().copied().take(len).collect();
        let mut distance = 0.0;
        let mut prev = start;
        for &stop in &stops {
            if stop != prev {
                distance += graph.distance(prev, stop)?;
            }
            prev = stop;
        }
        Ok(Self { stops, distance })
    }

    /// Appends `tail`, adding its distance.
    pub fn extend(&mut self, tail: PlannedRoute) {
        self.stops.extend(tail.stops);
        self.distance += tail.distance;
    }

    /// Appends a single stop reached over a leg of `distance`.
    pub fn push(&mut self, stop: LocationId, distance: f64) {
        self.stops.push(stop);
        self.distance += distance;
    }

    /// Consumes the route, returning its stops.
    pub fn into_stops(self) -> Vec<LocationId> {
        self.stops
    }
}

/// Multi-restart route optimizer with an injected random source.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use u_dispatch::graph::LocationGraph;
/// use u_dispatch::models::Location;
/// use u_dispatch::optimizer::RouteOptimizer;
///
/// let mut g = LocationGraph::new();
/// let hub = g.add_location(Location::new("Hub")).unwrap();
/// let a = g.add_location(Location::new("A")).unwrap();
/// let b = g.add_location(Location::new("B")).unwrap();
/// g.add_edge(hub, a, 1.0).unwrap();
/// g.add_edge(hub, b, 4.0).unwrap();
/// g.add_edge(a, b, 1.0).unwrap();
///
/// let mut optimizer = RouteOptimizer::with_seed(42, 50);
/// let candidates: BTreeSet<_> = [a, b].into_iter().collect();
/// let route = optimizer.optimize(&g, &candidates, hub, 16).unwrap();
/// assert_eq!(route.stops(), &[a, b]);
/// assert_eq!(route.distance(), 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct RouteOptimizer<R> {
    rng: R,
    trial_budget: usize,
}

impl RouteOptimizer<StdRng> {
    /// Creates an optimizer driven by a seeded [`StdRng`].
    pub fn with_seed(seed: u64, trial_budget: usize) -> Self {
        Self::new(StdRng::seed_from_u64(seed), trial_budget)
    }

    /// Creates an optimizer from `config.trial_budget` and `config.seed`,
    /// drawing a fresh seed when none is set.
    pub fn from_config(config: &EngineConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self::with_seed(seed, config.trial_budget)
    }
}

impl<R: Rng> RouteOptimizer<R> {
    /// Creates an optimizer drawing from `rng`.
    pub fn new(rng: R, trial_budget: usize) -> Self {
        Self { rng, trial_budget }
    }

    /// Number of constructions per [`optimize`](Self::optimize) call.
    pub fn trial_budget(&self) -> usize {
        self.trial_budget
    }

    /// Replaces the trial budget.
    pub fn set_trial_budget(&mut self, trials: usize) {
        self.trial_budget = trials;
    }

    /// Returns the shortest route found over the trial budget.
    ///
    /// An empty candidate set or a zero budget yields an empty route.
    /// Fails only when `start` or a candidate is not a graph vertex.
    pub fn optimize(
        &mut self,
        graph: &LocationGraph,
        candidates: &BTreeSet<LocationId>,
        start: LocationId,
        max_stops: usize,
    ) -> Result<PlannedRoute> {
        if candidates.is_empty() {
            return Ok(PlannedRoute::empty());
        }

        let mut best: Option<PlannedRoute> = None;
        for trial in 0..self.trial_budget {
            let route = self.construct(graph, candidates, start, max_stops)?;
            let improved = best.as_ref().map_or(true, |b| route.distance < b.distance);
            if improved {
                tracing::debug!(trial, distance = route.distance, stops = route.len(), "improved route");
                best = Some(route);
            }
        }
        Ok(best.unwrap_or_else(PlannedRoute::empty))
    }

    /// One randomized greedy construction.
    fn construct(
        &mut self,
        graph: &LocationGraph,
        candidates: &BTreeSet<LocationId>,
        start: LocationId,
        max_stops: usize,
    ) -> Result<PlannedRoute> {
        let mut remaining = candidates.clone();
        let mut route = PlannedRoute::empty();
        let mut current = start;

        while !remaining.is_empty() && route.len() < max_stops {
            let pick = self.rng.random_range(0..remaining.len());
            let Some(&waypoint) = remaining.iter().nth(pick) else {
                break;
            };

            let paths = ShortestPaths::compute(graph, current, remaining.iter().copied())?;
            let Some(path) = paths.reconstruct(waypoint) else {
                remaining.remove(&waypoint);
                continue;
            };

            for stop in path.stops() {
                remaining.remove(stop);
            }
            route.distance += path.distance();
            route.stops.extend_from_slice(&path.stops()[1..]);
            current = waypoint;
        }
        Ok(route)
    }
}
