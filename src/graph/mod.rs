//! Location graph.
//!
//! Provides the undirected weighted graph every search and dispatch runs on.

mod location_graph;

pub use location_graph::LocationGraph;
