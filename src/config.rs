//! Engine configuration.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RoutingError};

/// Tunable parameters for planning and dispatch.
///
/// Every field has a default, so a loader may deserialize a partial
/// document.
///
/// # Examples
///
/// ```
/// use u_dispatch::config::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_trial_budget(5000)
///     .with_max_stops(12)
///     .with_seed(42);
/// assert_eq!(config.vehicle_capacity, 16);
/// assert_eq!(config.trial_budget, 5000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of shipments a vehicle carries at once.
    pub vehicle_capacity: usize,

    /// Average travel speed in distance units per hour.
    pub average_speed: f64,

    /// Initial bucket count of the shipment store.
    pub table_capacity: usize,

    /// Linear probe constant. `c1 = c2 = 0` selects plain linear probing.
    pub probe_c1: u64,

    /// Quadratic probe constant.
    pub probe_c2: u64,

    /// Randomized route constructions per optimizer run.
    pub trial_budget: usize,

    /// Upper bound on stops in one constructed route.
    pub max_stops: usize,

    /// Shipments due strictly before this time form the priority wave.
    pub priority_cutoff: NaiveTime,

    /// Random seed for reproducible planning. `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vehicle_capacity: 16,
            average_speed: 18.0,
            table_capacity: 20,
            probe_c1: 0,
            probe_c2: 0,
            trial_budget: 1000,
            max_stops: 16,
            priority_cutoff: NaiveTime::from_hms_opt(11, 0, 0).unwrap_or(NaiveTime::MIN),
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn with_vehicle_capacity(mut self, capacity: usize) -> Self {
        self.vehicle_capacity = capacity;
        self
    }

    pub fn with_average_speed(mut self, speed: f64) -> Self {
        self.average_speed = speed;
        self
    }

    pub fn with_table_capacity(mut self, capacity: usize) -> Self {
        self.table_capacity = capacity;
        self
    }

    pub fn with_probe_constants(mut self, c1: u64, c2: u64) -> Self {
        self.probe_c1 = c1;
        self.probe_c2 = c2;
        self
    }

    pub fn with_trial_budget(mut self, trials: usize) -> Self {
        self.trial_budget = trials;
        self
    }

    pub fn with_max_stops(mut self, stops: usize) -> Self {
        self.max_stops = stops;
        self
    }

    pub fn with_priority_cutoff(mut self, cutoff: NaiveTime) -> Self {
        self.priority_cutoff = cutoff;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Rejects values a loader may have supplied out of range.
    pub fn validate(&self) -> Result<()> {
        if !self.average_speed.is_finite() || self.average_speed <= 0.0 {
            return Err(RoutingError::InvalidSpeed(self.average_speed));
        }
        Ok(())
    }

    /// Creates an empty shipment store sized and probed per this config.
    pub fn shipment_table(&self) -> crate::store::ShipmentTable {
        crate::store::HashTable::with_probing(self.table_capacity, self.probe_c1, self.probe_c2)
    }
}
