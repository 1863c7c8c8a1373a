//! Single-source shortest paths with a linear-scan frontier.
//!
//! # Algorithm
//!
//! 1. Every vertex starts at distance ∞, the origin at 0.
//! 2. The frontier holds the origin plus the candidate vertices, in graph
//!    registration order.
//! 3. Repeatedly remove the frontier vertex with the smallest tentative
//!    distance (first one wins on ties) and relax all its graph neighbors.
//!
//! Vertices outside the frontier may receive a tentative distance through
//! relaxation but are never expanded.
//!
//! # Complexity
//!
//! O(C² + C·d) where C = frontier size and d = maximum degree.

use crate::error::{Result, RoutingError};
use crate::graph::LocationGraph;
use crate::models::LocationId;

/// An ordered stop sequence with its summed edge weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    stops: Vec<LocationId>,
    distance: f64,
}

impl Path {
    /// Stops from origin to end, both included.
    pub fn stops(&self) -> &[LocationId] {
        &self.stops
    }

    /// Sum of edge weights between consecutive stops.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Returns `true` when the path never leaves its origin.
    pub fn is_trivial(&self) -> bool {
        self.stops.len() <= 1
    }

    /// Consumes the path, returning its stops.
    pub fn into_stops(self) -> Vec<LocationId> {
        self.stops
    }
}

/// Shortest-path scratch state for one search.
///
/// Distances and predecessors live here, indexed by [`LocationId`], so the
/// graph itself is never mutated by a search.
///
/// # Examples
///
/// ```
/// use u_dispatch::graph::LocationGraph;
/// use u_dispatch::models::Location;
/// use u_dispatch::pathfinding::ShortestPaths;
///
/// let mut g = LocationGraph::new();
/// let h = g.add_location(Location::new("H")).unwrap();
/// let a = g.add_location(Location::new("A")).unwrap();
/// let b = g.add_location(Location::new("B")).unwrap();
/// g.add_edge(h, a, 1.0).unwrap();
/// g.add_edge(a, b, 2.0).unwrap();
///
/// let sp = ShortestPaths::compute(&g, h, [a, b]).unwrap();
/// let path = sp.reconstruct(b).unwrap();
/// assert_eq!(path.stops(), &[h, a, b]);
/// assert_eq!(path.distance(), 3.0);
/// ```
#[derive(Debug, Clone)]
pub struct ShortestPaths<'g> {
    graph: &'g LocationGraph,
    origin: LocationId,
    distances: Vec<f64>,
    predecessors: Vec<Option<LocationId>>,
}

impl<'g> ShortestPaths<'g> {
    /// Runs the search from `origin`, expanding only `origin` and `candidates`.
    ///
    /// Fails if the origin or any candidate is not a graph vertex.
    pub fn compute<I>(graph: &'g LocationGraph, origin: LocationId, candidates: I) -> Result<Self>
    where
        I: IntoIterator<Item = LocationId>,
    {
        let n = graph.len();
        if !graph.contains(origin) {
            return Err(RoutingError::UnknownLocation(origin));
        }

        let mut in_frontier = vec![false; n];
        in_frontier[origin.index()] = true;
        for c in candidates {
            if !graph.contains(c) {
                return Err(RoutingError::UnknownLocation(c));
            }
            in_frontier[c.index()] = true;
        }

        let mut distances = vec![f64::INFINITY; n];
        let mut predecessors = vec![None; n];
        distances[origin.index()] = 0.0;

        let mut frontier: Vec<LocationId> =
            graph.ids().filter(|id| in_frontier[id.index()]).collect();

        while !frontier.is_empty() {
            let mut best = 0;
            for i in 1..frontier.len() {
                if distances[frontier[i].index()] < distances[frontier[best].index()] {
                    best = i;
                }
            }
            let current = frontier.remove(best);
            let base = distances[current.index()];

            for &next in graph.neighbors(current) {
                let through = base + graph.distance(current, next)?;
                if through < distances[next.index()] {
                    distances[next.index()] = through;
                    predecessors[next.index()] = Some(current);
                }
            }
        }

        Ok(Self {
            graph,
            origin,
            distances,
            predecessors,
        })
    }

    /// Search origin.
    pub fn origin(&self) -> LocationId {
        self.origin
    }

    /// Tentative distance from the origin, or `None` if `to` was never reached.
    pub fn distance_to(&self, to: LocationId) -> Option<f64> {
        self.distances
            .get(to.index())
            .copied()
            .filter(|d| d.is_finite())
    }

    /// Predecessor of `to` on its best-known path.
    pub fn predecessor(&self, to: LocationId) -> Option<LocationId> {
        self.predecessors.get(to.index()).copied().flatten()
    }

    /// Walks predecessor links from `end` back to the origin.
    ///
    /// `end == origin` yields the trivial path `[origin]` with distance 0.
    /// Returns `None` when no predecessor chain connects `end` to the origin.
    pub fn reconstruct(&self, end: LocationId) -> Option<Path> {
        if end == self.origin {
            return Some(Path {
                stops: vec![self.origin],
                distance: 0.0,
            });
        }
        self.distance_to(end)?;

        let mut stops = vec![end];
        let mut current = end;
        while current != self.origin {
            current = self.predecessor(current)?;
            stops.push(current);
            if stops.len() > self.distances.len() {
                return None;
            }
        }
        stops.reverse();

        let distance = stops
            .windows(2)
            .map(|leg| self.graph.edge_weight(leg[0], leg[1]))
            .sum::<Option<f64>>()?;

        Some(Path { stops, distance })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;

    fn graph_with(names: &[&str], edges: &[(usize, usize, f64)]) -> (LocationGraph, Vec<LocationId>) {
        let mut g = LocationGraph::new();
        let ids: Vec<LocationId> = names
            .iter()
            .map(|n| g.add_location(Location::new(*n)).expect("unique"))
            .collect();
        for &(a, b, w) in edges {
            g.add_edge(ids[a], ids[b], w).expect("valid");
        }
        (g, ids)
    }

    #[test]
    fn test_four_vertex_distances() {
        // S-A 1, S-B 4, A-B 2, A-C 6, B-C 3
        let (g, v) = graph_with(
            &["S", "A", "B", "C"],
            &[(0, 1, 1.0), (0, 2, 4.0), (1, 2, 2.0), (1, 3, 6.0), (2, 3, 3.0)],
        );
        let sp = ShortestPaths::compute(&g, v[0], v[1..].to_vec()).expect("valid");
        assert_eq!(sp.distance_to(v[0]), Some(0.0));
        assert_eq!(sp.distance_to(v[1]), Some(1.0));
        assert_eq!(sp.distance_to(v[2]), Some(3.0));
        assert_eq!(sp.distance_to(v[3]), Some(6.0));

        let path = sp.reconstruct(v[3]).expect("reachable");
        assert_eq!(path.stops(), &[v[0], v[1], v[2], v[3]]);
        assert_eq!(Some(path.distance()), sp.distance_to(v[3]));
        for &to in &v[1..] {
            let p = sp.reconstruct(to).expect("reachable");
            assert_eq!(Some(p.distance()), sp.distance_to(to));
        }
    }

    #[test]
    fn test_tie_keeps_first_predecessor() {
        // H-A 5, H-B 3, A-B 2: both routes to A weigh 5.
        let (g, v) = graph_with(&["H", "A", "B"], &[(0, 1, 5.0), (0, 2, 3.0), (1, 2, 2.0)]);
        let sp = ShortestPaths::compute(&g, v[0], [v[1], v[2]]).expect("valid");
        assert_eq!(sp.distance_to(v[1]), Some(5.0));
        assert_eq!(sp.predecessor(v[1]), Some(v[0]));
        let path = sp.reconstruct(v[1]).expect("reachable");
        assert_eq!(path.stops(), &[v[0], v[1]]);
        assert_eq!(path.distance(), 5.0);
    }

    #[test]
    fn test_candidates_bound_expansion() {
        // S-A 1, A-C 1, S-C 5. A is not a candidate, so it is never expanded.
        let (g, v) = graph_with(&["S", "A", "C"], &[(0, 1, 1.0), (1, 2, 1.0), (0, 2, 5.0)]);
        let sp = ShortestPaths::compute(&g, v[0], [v[2]]).expect("valid");
        assert_eq!(sp.distance_to(v[1]), Some(1.0));
        assert_eq!(sp.distance_to(v[2]), Some(5.0));
        assert_eq!(sp.reconstruct(v[2]).map(Path::into_stops), Some(vec![v[0], v[2]]));

        let full = ShortestPaths::compute(&g, v[0], [v[1], v[2]]).expect("valid");
        assert_eq!(full.distance_to(v[2]), Some(2.0));
    }

    #[test]
    fn test_origin_path_is_trivial() {
        let (g, v) = graph_with(&["S", "A"], &[(0, 1, 1.0)]);
        let sp = ShortestPaths::compute(&g, v[0], [v[1]]).expect("valid");
        let path = sp.reconstruct(v[0]).expect("origin");
        assert!(path.is_trivial());
        assert_eq!(path.stops(), &[v[0]]);
        assert_eq!(path.distance(), 0.0);
    }

    #[test]
    fn test_unreachable_is_none() {
        let (g, v) = graph_with(&["S", "A", "Island"], &[(0, 1, 1.0)]);
        let sp = ShortestPaths::compute(&g, v[0], [v[1], v[2]]).expect("valid");
        assert!(sp.distance_to(v[2]).is_none());
        assert!(sp.reconstruct(v[2]).is_none());
        assert!(sp.predecessor(v[2]).is_none());
    }

    #[test]
    fn test_unknown_vertices_rejected() {
        let (g, v) = graph_with(&["S"], &[]);
        assert!(matches!(
            ShortestPaths::compute(&g, LocationId(9), [v[0]]),
            Err(RoutingError::UnknownLocation(LocationId(9)))
        ));
        assert!(ShortestPaths::compute(&g, v[0], [LocationId(3)]).is_err());
    }

    #[test]
    fn test_empty_candidates_expands_origin_only() {
        let (g, v) = graph_with(&["S", "A", "B"], &[(0, 1, 1.0), (1, 2, 1.0)]);
        let sp = ShortestPaths::compute(&g, v[0], Vec::new()).expect("valid");
        assert_eq!(sp.distance_to(v[1]), Some(1.0));
        assert!(sp.distance_to(v[2]).is_none());
    }
}
