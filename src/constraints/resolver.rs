//! Constraint sets derived from loader-supplied shipment ids.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::models::ShipmentId;
use crate::store::ShipmentTable;

/// Shipment constraints as supplied by the loader.
///
/// Ids refer to shipments in the store; unknown ids are dropped during
/// [`ConstraintSets::resolve`].
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use u_dispatch::constraints::ConstraintSpec;
///
/// let spec = ConstraintSpec::default()
///     .with_group([13, 14, 15, 16, 19, 20])
///     .with_affinity("Truck 2", [3, 18, 36, 38])
///     .with_delayed([6, 25, 28, 32], NaiveTime::from_hms_opt(9, 5, 0))
///     .with_pending_correction([9]);
/// assert_eq!(spec.grouped.len(), 6);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintSpec {
    /// Shipments that must all travel on the same route.
    pub grouped: Vec<ShipmentId>,

    /// Shipments pinned to a named vehicle.
    pub vehicle_affinity: BTreeMap<String, Vec<ShipmentId>>,

    /// Shipments that reach the hub late.
    pub delayed: Vec<ShipmentId>,

    /// Earliest time delayed shipments may leave the hub.
    pub delayed_until: Option<NaiveTime>,

    /// Shipments whose destination must be corrected before routing.
    pub pending_correction: Vec<ShipmentId>,
}

impl ConstraintSpec {
    pub fn with_group(mut self, ids: impl IntoIterator<Item = ShipmentId>) -> Self {
        self.grouped.extend(ids);
        self
    }

    pub fn with_affinity(
        mut self,
        vehicle: impl Into<String>,
        ids: impl IntoIterator<Item = ShipmentId>,
    ) -> Self {
        self.vehicle_affinity
            .entry(vehicle.into())
            .or_default()
            .extend(ids);
        self
    }

    pub fn with_delayed(
        mut self,
        ids: impl IntoIterator<Item = ShipmentId>,
        until: Option<NaiveTime>,
    ) -> Self {
        self.delayed.extend(ids);
        self.delayed_until = until;
        self
    }

    pub fn with_pending_correction(mut self, ids: impl IntoIterator<Item = ShipmentId>) -> Self {
        self.pending_correction.extend(ids);
        self
    }
}

/// Read-only constraint sets resolved against the shipment store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSets {
    grouped: BTreeSet<ShipmentId>,
    vehicle_affinity: BTreeMap<String, BTreeSet<ShipmentId>>,
    delayed: BTreeSet<ShipmentId>,
    delayed_until: Option<NaiveTime>,
    pending_correction: BTreeSet<ShipmentId>,
}

impl ConstraintSets {
    /// Resolves `spec` against `store`, keeping only ids that exist.
    pub fn resolve(spec: &ConstraintSpec, store: &ShipmentTable) -> Self {
        let known = |set: &'static str, ids: &[ShipmentId]| -> BTreeSet<ShipmentId> {
            ids.iter()
                .copied()
                .filter(|&id| {
                    let found = store.contains(u64::from(id));
                    if !found {
                        tracing::warn!(shipment = id, set, "constraint refers to unknown shipment");
                    }
                    found
                })
                .collect()
        };

        Self {
            grouped: known("grouped", &spec.grouped),
            vehicle_affinity: spec
                .vehicle_affinity
                .iter()
                .map(|(vehicle, ids)| (vehicle.clone(), known("vehicle_affinity", ids)))
                .collect(),
            delayed: known("delayed", &spec.delayed),
            delayed_until: spec.delayed_until,
            pending_correction: known("pending_correction", &spec.pending_correction),
        }
    }

    /// Shipments that must ride together.
    pub fn grouped(&self) -> &BTreeSet<ShipmentId> {
        &self.grouped
    }

    /// Shipments that arrive at the hub late.
    pub fn delayed(&self) -> &BTreeSet<ShipmentId> {
        &self.delayed
    }

    /// Shipments awaiting an address correction.
    pub fn pending_correction(&self) -> &BTreeSet<ShipmentId> {
        &self.pending_correction
    }

    /// Shipments pinned to `vehicle`.
    pub fn affinity(&self, vehicle: &str) -> BTreeSet<ShipmentId> {
        self.vehicle_affinity
            .get(vehicle)
            .cloned()
            .unwrap_or_default()
    }

    /// Vehicle a shipment is pinned to, if any.
    pub fn affinity_of(&self, id: ShipmentId) -> Option<&str> {
        self.vehicle_affinity
            .iter()
            .find(|(_, ids)| ids.contains(&id))
            .map(|(vehicle, _)| vehicle.as_str())
    }

    /// Shipments pinned to any vehicle other than `vehicle`.
    pub fn excluded_for(&self, vehicle: &str) -> BTreeSet<ShipmentId> {
        self.vehicle_affinity
            .iter()
            .filter(|(name, _)| name.as_str() != vehicle)
            .flat_map(|(_, ids)| ids.iter().copied())
            .filter(|&id| self.affinity_of(id) != Some(vehicle))
            .collect()
    }

    /// Returns `true` once delayed shipments may leave the hub at `now`.
    ///
    /// Without a release time, delayed shipments are held back only from
    /// the priority wave.
    pub fn delayed_released(&self, now: NaiveTime) -> bool {
        self.delayed_until.map_or(true, |until| now >= until)
    }

    /// Release time for delayed shipments, if any.
    pub fn delayed_until(&self) -> Option<NaiveTime> {
        self.delayed_until
    }
}
