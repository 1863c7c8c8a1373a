//! Route optimization.
//!
//! - [`RouteOptimizer`] — randomized greedy multi-restart construction over
//!   a candidate set, O(T·S·C²)
//! - [`plan_route`] — optimizes through a shipment pool's destinations and
//!   selects the shipments that fit the load
//! - [`match_shipments`] — shipments whose destinations lie on a route

mod assignment;
mod random_restart;

pub use assignment::{match_shipments, plan_route, RoutePlan};
pub use random_restart::{PlannedRoute, RouteOptimizer};
