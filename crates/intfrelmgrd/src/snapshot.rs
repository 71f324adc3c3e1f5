//! Inventory state snapshot.
//!
//! The daemon keeps devices, interfaces and relationships in memory and
//! persists them between invocations as one pretty-printed JSON document.
//! Loading replays every record through the same constraint checks as live
//! writes, so a hand-edited file cannot introduce a second relationship for an
//! interface or a child without its parent.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sonic_inventory::{Device, Interface, Inventory, MemoryInventory};
use tracing::{debug, info};

use crate::error::{IntfRelError, IntfRelResult};
use crate::relationship::{InterfaceRelationship, MemoryRelationshipStore, RelationshipStore};
use crate::tables::SNAPSHOT_VERSION;

/// Serialized form of the inventory and relationship store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// Format version
    pub version: u32,

    /// When the snapshot was taken
    pub saved_at: DateTime<Utc>,

    #[serde(default)]
    pub devices: Vec<Device>,

    /// Interfaces in id order (parents before children)
    #[serde(default)]
    pub interfaces: Vec<Interface>,

    #[serde(default)]
    pub relationships: Vec<InterfaceRelationship>,
}

impl InventorySnapshot {
    /// Captures the current state.
    pub fn capture(inventory: &MemoryInventory, relationships: &MemoryRelationshipStore) -> Self {
        let mut devices: Vec<Device> = inventory.devices().into_iter().cloned().collect();
        devices.sort_by_key(|d| d.id);

        let mut rows: Vec<InterfaceRelationship> =
            relationships.list_all().into_iter().cloned().collect();
        rows.sort_by_key(|r| r.id);

        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            devices,
            interfaces: inventory.all_interfaces().cloned().collect(),
            relationships: rows,
        }
    }

    /// Rebuilds the inventory and relationship store from this snapshot.
    ///
    /// Every relationship must reference existing interfaces and satisfy the
    /// per-role uniqueness rules.
    pub fn restore(self) -> IntfRelResult<(MemoryInventory, MemoryRelationshipStore)> {
        if self.version != SNAPSHOT_VERSION {
            return Err(IntfRelError::Configuration(format!(
                "unsupported snapshot version {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }

        let mut inventory = MemoryInventory::new();
        for device in self.devices {
            inventory.restore_device(device)?;
        }

        let mut interfaces = self.interfaces;
        interfaces.sort_by_key(|i| i.id);
        for interface in interfaces {
            inventory.restore_interface(interface)?;
        }

        let mut relationships = MemoryRelationshipStore::new();
        for relationship in self.relationships {
            if let Some(missing) = relationship
                .interfaces()
                .into_iter()
                .find(|id| inventory.interface(*id).is_none())
            {
                return Err(IntfRelError::Configuration(format!(
                    "relationship {} references unknown interface {}",
                    relationship.id, missing
                )));
            }
            relationships.restore(relationship)?;
        }

        Ok((inventory, relationships))
    }

    /// Writes the snapshot to `path` via a temporary file and rename.
    pub fn save(&self, path: impl AsRef<Path>) -> IntfRelResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                IntfRelError::snapshot(
                    path,
                    format!("failed to create directory {}: {}", parent.display(), e),
                )
            })?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| IntfRelError::snapshot(path, format!("failed to serialize: {}", e)))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| IntfRelError::snapshot(&tmp, format!("failed to write: {}", e)))?;
        fs::rename(&tmp, path)
            .map_err(|e| IntfRelError::snapshot(path, format!("failed to replace: {}", e)))?;

        debug!(
            "Saved snapshot to {} ({} devices, {} interfaces, {} relationships)",
            path.display(),
            self.devices.len(),
            self.interfaces.len(),
            self.relationships.len()
        );
        Ok(())
    }

    /// Reads a snapshot from `path`.
    pub fn load(path: impl AsRef<Path>) -> IntfRelResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| IntfRelError::snapshot(path, format!("failed to read: {}", e)))?;
        serde_json::from_str(&json)
            .map_err(|e| IntfRelError::snapshot(path, format!("failed to parse: {}", e)))
    }
}

/// Loads state from `path`, or returns empty state if the file does not exist.
pub fn load_or_empty(
    path: impl AsRef<Path>,
) -> IntfRelResult<(MemoryInventory, MemoryRelationshipStore)> {
    let path = path.as_ref();

    if !path.exists() {
        info!("No state file at {}, starting empty", path.display());
        return Ok((MemoryInventory::new(), MemoryRelationshipStore::new()));
    }

    let snapshot = InventorySnapshot::load(path)?;
    snapshot
        .restore()
        .map_err(|e| IntfRelError::snapshot(path, e.to_string()))
}

/// Captures and saves state to `path`.
pub fn save(
    path: impl AsRef<Path>,
    inventory: &MemoryInventory,
    relationships: &MemoryRelationshipStore,
) -> IntfRelResult<()> {
    InventorySnapshot::capture(inventory, relationships).save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sonic_inventory::{InterfaceId, InterfaceType, NewInterface};

    fn sample() -> (MemoryInventory, MemoryRelationshipStore) {
        let mut inv = MemoryInventory::new();
        let dev = inv.add_device("leaf01");
        let eth0 = inv
            .create_interface(NewInterface::new(dev, "eth0", InterfaceType::default()))
            .unwrap();
        let rx = inv
            .create_interface(
                NewInterface::new(dev, "eth0_rx", InterfaceType::default()).with_parent(eth0),
            )
            .unwrap();
        let tx = inv
            .create_interface(
                NewInterface::new(dev, "eth0_tx", InterfaceType::default()).with_parent(eth0),
            )
            .unwrap();
        let mut store = MemoryRelationshipStore::new();
        store.create(eth0, rx, tx).unwrap();
        (inv, store)
    }

    #[test]
    fn test_capture_and_restore() {
        let (inv, store) = sample();
        let snapshot = InventorySnapshot::capture(&inv, &store);
        assert_eq!(snapshot.interfaces.len(), 3);
        assert_eq!(snapshot.relationships.len(), 1);

        let (inv2, store2) = snapshot.clone().restore().unwrap();
        assert_eq!(InventorySnapshot::capture(&inv2, &store2).interfaces, snapshot.interfaces);
        assert_eq!(store2.len(), 1);
    }

    #[test]
    fn test_restore_rejects_duplicate_role() {
        let (inv, store) = sample();
        let mut snapshot = InventorySnapshot::capture(&inv, &store);
        let mut dup = snapshot.relationships[0].clone();
        dup.id = crate::relationship::RelationshipId::new(2);
        snapshot.relationships.push(dup);

        let err = snapshot.restore().unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_restore_rejects_dangling_relationship() {
        let (inv, store) = sample();
        let mut snapshot = InventorySnapshot::capture(&inv, &store);
        snapshot.relationships[0].tx_interface = InterfaceId::new(99);

        let err = snapshot.restore().unwrap_err();
        assert!(err.to_string().contains("unknown interface 99"));
    }

    #[test]
    fn test_restore_rejects_unknown_version() {
        let (inv, store) = sample();
        let mut snapshot = InventorySnapshot::capture(&inv, &store);
        snapshot.version = 0;
        assert!(matches!(
            snapshot.restore(),
            Err(IntfRelError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_or_empty_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let (inv, store) = load_or_empty(dir.path().join("absent.json")).unwrap();
        assert_eq!(inv.interface_count(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("inventory.json");
        let (inv, store) = sample();

        save(&path, &inv, &store).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_load_garbage_is_snapshot_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.json");
        fs::write(&path, "not json").unwrap();

        let err = load_or_empty(&path).unwrap_err();
        assert!(matches!(err, IntfRelError::Snapshot { .. }));
    }
}
