//! Inventory record types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Primary key of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(u64);

impl DeviceId {
    /// Creates a device id from its raw value.
    pub const fn new(id: u64) -> Self {
        DeviceId(id)
    }

    /// Returns the raw id.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(DeviceId)
    }
}

/// Primary key of an interface, unique across all devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfaceId(u64);

impl InterfaceId {
    /// Creates an interface id from its raw value.
    pub const fn new(id: u64) -> Self {
        InterfaceId(id)
    }

    /// Returns the raw id.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InterfaceId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(InterfaceId)
    }
}

/// Interface type label as stored in the inventory.
///
/// The label is opaque: it is copied, compared and displayed, never
/// interpreted (`1000base-t`, `virtual`, `10gbase-x-sfpp`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfaceType(String);

impl InterfaceType {
    /// Type label used for interfaces created without an explicit type.
    pub const VIRTUAL: &'static str = "virtual";

    /// Creates a type label.
    pub fn new(kind: impl Into<String>) -> Self {
        InterfaceType(kind.into())
    }

    /// Returns the label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for InterfaceType {
    fn default() -> Self {
        InterfaceType::new(Self::VIRTUAL)
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InterfaceType {
    fn from(kind: &str) -> Self {
        InterfaceType::new(kind)
    }
}

/// A managed device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An interface attached to a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub id: InterfaceId,
    /// Unique per device.
    pub name: String,
    pub device: DeviceId,
    #[serde(rename = "type")]
    pub kind: InterfaceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<InterfaceId>,
    #[serde(default)]
    pub description: String,
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Creation request for an interface; the inventory assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInterface {
    pub device: DeviceId,
    pub name: String,
    pub kind: InterfaceType,
    pub parent: Option<InterfaceId>,
    pub description: String,
}

impl NewInterface {
    /// Creates a request for a top-level interface with no description.
    pub fn new(device: DeviceId, name: impl Into<String>, kind: InterfaceType) -> Self {
        Self {
            device,
            name: name.into(),
            kind,
            parent: None,
            description: String::new(),
        }
    }

    /// Sets the parent interface.
    pub fn with_parent(mut self, parent: InterfaceId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_id_parse_and_display() {
        let id: InterfaceId = " 42 ".parse().unwrap();
        assert_eq!(id, InterfaceId::new(42));
        assert_eq!(id.to_string(), "42");

        assert!("eth0".parse::<DeviceId>().is_err());
    }

    #[test]
    fn test_interface_type_default() {
        assert_eq!(InterfaceType::default().as_str(), "virtual");
    }

    #[test]
    fn test_new_interface_builder() {
        let req = NewInterface::new(DeviceId::new(1), "eth0_rx", "1000base-t".into())
            .with_parent(InterfaceId::new(7))
            .with_description("RX interface for eth0");

        assert_eq!(req.parent, Some(InterfaceId::new(7)));
        assert_eq!(req.description, "RX interface for eth0");
        assert_eq!(req.kind.as_str(), "1000base-t");
    }

    #[test]
    fn test_interface_serde_field_names() {
        let intf = Interface {
            id: InterfaceId::new(5),
            name: "eth0".to_string(),
            device: DeviceId::new(1),
            kind: InterfaceType::new("1000base-t"),
            parent: None,
            description: String::new(),
        };

        let json = serde_json::to_value(&intf).unwrap();
        assert_eq!(json["type"], "1000base-t");
        assert_eq!(json["id"], 5);
        assert!(json.get("parent").is_none());

        let back: Interface = serde_json::from_value(json).unwrap();
        assert_eq!(back, intf);
    }
}
