//! Undirected weighted location graph.

use std::collections::HashMap;

use crate::error::{Result, RoutingError};
use crate::models::{Location, LocationId};

/// An undirected graph of delivery locations with symmetric edge weights.
///
/// Vertices are stored densely and addressed by [`LocationId`]; adjacency
/// lists keep edge insertion order, which searches iterate in.
///
/// # Examples
///
/// ```
/// use u_dispatch::graph::LocationGraph;
/// use u_dispatch::models::Location;
///
/// let mut graph = LocationGraph::new();
/// let hub = graph.add_location(Location::new("Hub")).unwrap();
/// let a = graph.add_location(Location::new("A")).unwrap();
/// graph.add_edge(hub, a, 5.0).unwrap();
///
/// assert_eq!(graph.distance(a, hub).unwrap(), 5.0);
/// assert_eq!(graph.locate("A"), Some(a));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LocationGraph {
    locations: Vec<Location>,
    by_address: HashMap<String, LocationId>,
    adjacency: Vec<Vec<LocationId>>,
    weights: HashMap<(LocationId, LocationId), f64>,
}

impl LocationGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a location with an empty adjacency list.
    ///
    /// Fails if a location with the same address already exists.
    pub fn add_location(&mut self, location: Location) -> Result<LocationId> {
        if self.by_address.contains_key(location.address()) {
            return Err(RoutingError::DuplicateLocation(
                location.address().to_string(),
            ));
        }
        let id = LocationId(self.locations.len());
        self.by_address.insert(location.address().to_string(), id);
        self.locations.push(location);
        self.adjacency.push(Vec::new());
        Ok(id)
    }

    /// Connects `a` and `b` in both directions with the same weight.
    ///
    /// Re-adding an existing edge overwrites its weight.
    pub fn add_edge(&mut self, a: LocationId, b: LocationId, distance: f64) -> Result<()> {
        if !distance.is_finite() || distance <= 0.0 {
            return Err(RoutingError::InvalidDistance(distance));
        }
        self.check(a)?;
        self.check(b)?;

        if self.weights.insert((a, b), distance).is_none() {
            self.adjacency[a.index()].push(b);
            if a != b {
                self.adjacency[b.index()].push(a);
            }
        }
        self.weights.insert((b, a), distance);
        Ok(())
    }

    /// Weight of the direct edge between `a` and `b`.
    ///
    /// This is a raw edge lookup, not a path distance.
    pub fn distance(&self, a: LocationId, b: LocationId) -> Result<f64> {
        self.edge_weight(a, b)
            .ok_or(RoutingError::MissingEdge { from: a, to: b })
    }

    /// Weight of the direct edge, or `None` when the pair is not adjacent.
    pub fn edge_weight(&self, a: LocationId, b: LocationId) -> Option<f64> {
        self.weights.get(&(a, b)).copied()
    }

    /// Looks a location up by its exact address.
    pub fn locate(&self, address: &str) -> Option<LocationId> {
        self.by_address.get(address).copied()
    }

    /// Returns the location stored under `id`.
    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(id.index())
    }

    /// Neighbors of `id` in edge insertion order.
    pub fn neighbors(&self, id: LocationId) -> &[LocationId] {
        self.adjacency
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns `true` if `id` is a registered vertex.
    pub fn contains(&self, id: LocationId) -> bool {
        id.index() < self.locations.len()
    }

    /// All vertex ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = LocationId> + '_ {
        (0..self.locations.len()).map(LocationId)
    }

    /// Number of locations.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Returns `true` if no location is registered.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Returns `true` if every edge weight matches its reverse within `tol`.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        self.weights.iter().all(|(&(a, b), &w)| {
            self.weights
                .get(&(b, a))
                .is_some_and(|&back| (back - w).abs() <= tol)
        })
    }

    fn check(&self, id: LocationId) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(RoutingError::UnknownLocation(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (LocationGraph, LocationId, LocationId, LocationId) {
        let mut g = LocationGraph::new();
        let h = g.add_location(Location::new("H")).expect("new");
        let a = g.add_location(Location::new("A")).expect("new");
        let b = g.add_location(Location::new("B")).expect("new");
        g.add_edge(h, a, 5.0).expect("valid");
        g.add_edge(h, b, 3.0).expect("valid");
        g.add_edge(a, b, 2.0).expect("valid");
        (g, h, a, b)
    }

    #[test]
    fn test_add_location() {
        let (g, h, a, b) = triangle();
        assert_eq!(g.len(), 3);
        assert_eq!((h, a, b), (LocationId(0), LocationId(1), LocationId(2)));
        assert_eq!(g.location(a).map(Location::address), Some("A"));
        assert_eq!(g.ids().collect::<Vec<_>>(), vec![h, a, b]);
    }

    #[test]
    fn test_duplicate_location() {
        let (mut g, ..) = triangle();
        assert_eq!(
            g.add_location(Location::new("A")),
            Err(RoutingError::DuplicateLocation("A".into()))
        );
        assert_eq!(g.len(), 3);
    }

    #[test]
    fn test_symmetric_edges() {
        let (g, h, a, b) = triangle();
        for (x, y, w) in [(h, a, 5.0), (h, b, 3.0), (a, b, 2.0)] {
            assert_eq!(g.distance(x, y), Ok(w));
            assert_eq!(g.distance(y, x), Ok(w));
        }
        assert!(g.is_symmetric(0.0));
    }

    #[test]
    fn test_neighbors_in_insertion_order() {
        let (g, h, a, b) = triangle();
        assert_eq!(g.neighbors(h), &[a, b]);
        assert_eq!(g.neighbors(a), &[h, b]);
        assert_eq!(g.neighbors(b), &[h, a]);
        assert!(g.neighbors(LocationId(99)).is_empty());
    }

    #[test]
    fn test_missing_edge() {
        let mut g = LocationGraph::new();
        let a = g.add_location(Location::new("A")).expect("new");
        let b = g.add_location(Location::new("B")).expect("new");
        assert_eq!(
            g.distance(a, b),
            Err(RoutingError::MissingEdge { from: a, to: b })
        );
        assert!(g.edge_weight(a, b).is_none());
    }

    #[test]
    fn test_invalid_edges() {
        let (mut g, h, a, _) = triangle();
        assert_eq!(g.add_edge(h, a, 0.0), Err(RoutingError::InvalidDistance(0.0)));
        assert!(g.add_edge(h, a, -1.0).is_err());
        assert!(g.add_edge(h, a, f64::NAN).is_err());
        assert_eq!(
            g.add_edge(h, LocationId(7), 1.0),
            Err(RoutingError::UnknownLocation(LocationId(7)))
        );
        assert_eq!(g.distance(h, a), Ok(5.0));
    }

    #[test]
    fn test_readd_edge_overwrites() {
        let (mut g, h, a, _) = triangle();
        g.add_edge(a, h, 4.5).expect("valid");
        assert_eq!(g.distance(h, a), Ok(4.5));
        assert_eq!(g.neighbors(h).len(), 2);
    }

    #[test]
    fn test_locate() {
        let (g, _, _, b) = triangle();
        assert_eq!(g.locate("B"), Some(b));
        assert_eq!(g.locate("Z"), None);
    }
}
