//! Location vertex type and its dense graph index.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dense index of a location inside a [`LocationGraph`](crate::graph::LocationGraph).
///
/// Ids are handed out in registration order starting at zero, which is also
/// the iteration order every search uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocationId(pub usize);

impl LocationId {
    /// Position of this location in per-vertex arrays.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A delivery location (graph vertex).
///
/// The address is the identity; postal code and display name are carried
/// along for reporting only.
///
/// # Examples
///
/// ```
/// use u_dispatch::models::Location;
///
/// let hub = Location::new("4001 South 700 East").with_name("Western Governors University");
/// assert_eq!(hub.address(), "4001 South 700 East");
/// assert_eq!(hub.to_string(), "4001 South 700 East Western Governors University");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    address: String,
    postal_code: Option<String>,
    name: Option<String>,
}

impl Location {
    /// Creates a location identified by its street address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            postal_code: None,
            name: None,
        }
    }

    /// Sets the postal code.
    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Street address (primary key).
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Postal code, if known.
    pub fn postal_code(&self) -> Option<&str> {
        self.postal_code.as_deref()
    }

    /// Display name, if known.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} {}", self.address, name),
            None => f.write_str(&self.address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_new() {
        let loc = Location::new("195 W Oakland Ave");
        assert_eq!(loc.address(), "195 W Oakland Ave");
        assert!(loc.postal_code().is_none());
        assert!(loc.name().is_none());
        assert_eq!(loc.to_string(), "195 W Oakland Ave");
    }

    #[test]
    fn test_location_builder() {
        let loc = Location::new("1060 Dalton Ave S")
            .with_postal_code("84104")
            .with_name("International Peace Gardens");
        assert_eq!(loc.postal_code(), Some("84104"));
        assert_eq!(loc.name(), Some("International Peace Gardens"));
    }

    #[test]
    fn test_location_id_order() {
        assert!(LocationId(1) < LocationId(2));
        assert_eq!(LocationId(3).index(), 3);
        assert_eq!(LocationId(3).to_string(), "#3");
    }
}
