//! Shipment store.
//!
//! Provides an open-addressing hash table with explicit tombstones and the
//! shipment-keyed alias the engine works with.

mod hash_table;

pub use hash_table::{Bucket, HashTable, Rejected, TableEntry};

/// Shipment store keyed by shipment id.
pub type ShipmentTable = HashTable<crate::models::Shipment>;
