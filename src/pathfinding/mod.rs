//! Shortest-path engine.
//!
//! - [`ShortestPaths`] — Dijkstra with a linear-scan frontier restricted to
//!   a candidate subset, O(C²)
//! - [`Path`] — reconstructed stop sequence with its total weight

mod dijkstra;

pub use dijkstra::{Path, ShortestPaths};
