//! # u-dispatch
//!
//! Delivery route planning and dispatch over a weighted location graph:
//! shipments wait at a hub, vehicles with limited capacity carry them out
//! on randomized shortest-path routes, and a simulated clock records every
//! status change.
//!
//! ## Modules
//!
//! - [`models`] — Locations, shipments and the simulated clock
//! - [`graph`] — Undirected weighted location graph
//! - [`store`] — Open-addressing shipment table
//! - [`pathfinding`] — Candidate-bounded Dijkstra and path reconstruction
//! - [`optimizer`] — Randomized multi-restart route construction
//! - [`constraints`] — Grouping, vehicle affinity, delayed arrival and
//!   address correction sets
//! - [`dispatch`] — Vehicle state machine and wave-based dispatch engine
//! - [`report`] — End-of-day mileage, status counts and violations
//! - [`config`] — Engine parameters
//! - [`error`] — Error type

pub mod config;
pub mod constraints;
pub mod dispatch;
pub mod error;
pub mod graph;
pub mod models;
pub mod optimizer;
pub mod pathfinding;
pub mod report;
pub mod store;

pub use error::{Result, RoutingError};
