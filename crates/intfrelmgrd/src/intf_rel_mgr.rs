//! Interface Relationship Manager - Core implementation

use serde_json::json;
use sonic_inventory::{
    Device, DeviceId, Interface, InterfaceId, Inventory, MemoryInventory, NewInterface,
};
use tracing::{debug, error, info, warn};

use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::audit_log;
use crate::eligibility::eligible_interfaces;
use crate::error::{IntfRelError, IntfRelResult};
use crate::relationship::{
    InterfaceRelationship, MemoryRelationshipStore, RelationshipId, RelationshipStore,
};
use crate::tables::*;

const SOURCE: &str = "IntfRelMgr";

/// Statistics for split operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntfRelMgrStats {
    /// Successful splits.
    pub splits_succeeded: u64,
    /// Failed splits.
    pub splits_failed: u64,
    /// RX/TX interfaces created by successful splits.
    pub interfaces_created: u64,
    /// Interfaces deleted again after a failed split.
    pub interfaces_rolled_back: u64,
    /// Relationships removed because one of their interfaces was deleted.
    pub relationships_cascaded: u64,
}

/// Interface Relationship Manager
///
/// Owns the inventory and the relationship store and is the only place that
/// writes to either, so that:
/// - a split creates both derived interfaces and the relationship, or nothing
/// - deleting an interface removes the relationships that reference it
/// - interfaces already in a relationship are never split again
pub struct IntfRelMgr<I = MemoryInventory, S = MemoryRelationshipStore> {
    inventory: I,
    relationships: S,
    stats: IntfRelMgrStats,
}

impl<I, S> std::fmt::Debug for IntfRelMgr<I, S>
where
    S: RelationshipStore,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntfRelMgr")
            .field("relationship_count", &self.relationships.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl IntfRelMgr<MemoryInventory, MemoryRelationshipStore> {
    /// Creates a manager over an empty in-memory inventory and store.
    pub fn in_memory() -> Self {
        Self::new(MemoryInventory::new(), MemoryRelationshipStore::new())
    }
}

impl<S: RelationshipStore> IntfRelMgr<MemoryInventory, S> {
    /// Adds a device to the in-memory inventory.
    pub fn add_device(&mut self, name: impl Into<String>) -> DeviceId {
        let name = name.into();
        let id = self.inventory.add_device(name.clone());
        info!("Added device {} ({})", name, id);
        id
    }
}

impl<I, S> IntfRelMgr<I, S>
where
    I: Inventory,
    S: RelationshipStore,
{
    /// Creates a manager over an existing inventory and relationship store.
    pub fn new(inventory: I, relationships: S) -> Self {
        Self {
            inventory,
            relationships,
            stats: IntfRelMgrStats::default(),
        }
    }

    /// Returns the inventory.
    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    /// Returns the relationship store.
    pub fn relationships(&self) -> &S {
        &self.relationships
    }

    /// Returns the statistics.
    pub fn stats(&self) -> &IntfRelMgrStats {
        &self.stats
    }

    /// Splits the manager back into its inventory and store.
    pub fn into_parts(self) -> (I, S) {
        (self.inventory, self.relationships)
    }

    /// Returns all devices ordered by name.
    pub fn devices(&self) -> Vec<&Device> {
        self.inventory.devices()
    }

    /// Returns the interfaces of `device` that can still be split, by name.
    ///
    /// Always computed from the current store contents.
    pub fn candidates(&self, device: DeviceId) -> IntfRelResult<Vec<Interface>> {
        eligible_interfaces(&self.inventory, &self.relationships, device)
    }

    /// Adds a top-level or child interface to the inventory.
    pub fn add_interface(&mut self, new: NewInterface) -> IntfRelResult<InterfaceId> {
        let name = new.name.clone();
        let device = new.device;
        let id = self.inventory.create_interface(new)?;
        info!("Added interface {} ({}) to device {}", name, id, device);
        Ok(id)
    }

    /// Splits `interface_name` on `device` into `<name>_rx` and `<name>_tx`.
    ///
    /// On success the original interface becomes the main interface of a new
    /// relationship whose RX and TX interfaces are children of it. On failure
    /// the error is always `OperationFailed` wrapping the cause, and any
    /// interface created by this call has been deleted again.
    pub fn split_interface(
        &mut self,
        device: DeviceId,
        interface_name: &str,
    ) -> IntfRelResult<RelationshipId> {
        let mut created = Vec::with_capacity(2);

        match self.try_split(device, interface_name, &mut created) {
            Ok(relationship) => {
                self.stats.splits_succeeded += 1;
                self.stats.interfaces_created += created.len() as u64;

                info!(
                    "Split interface {} on device {} (relationship {})",
                    interface_name, device, relationship
                );
                audit_log!(
                    AuditRecord::new(AuditCategory::ResourceCreate, SOURCE, "split_interface")
                        .with_outcome(AuditOutcome::Success)
                        .with_object_id(relationship.to_string())
                        .with_object_type(audit_objects::RELATIONSHIP)
                        .with_details(json!({
                            "device_id": device.as_u64(),
                            "main_interface": interface_name,
                            "rx_interface": rx_name(interface_name),
                            "tx_interface": tx_name(interface_name),
                            "stats": {
                                "splits_succeeded": self.stats.splits_succeeded
                            }
                        }))
                );
                Ok(relationship)
            }
            Err(cause) => {
                let cleanup = self.roll_back(&created);
                let err = IntfRelError::operation_failed(cause, cleanup);
                self.stats.splits_failed += 1;

                warn!("{}", err);
                audit_log!(
                    AuditRecord::new(AuditCategory::ErrorCondition, SOURCE, "split_interface")
                        .with_object_id(interface_name.to_string())
                        .with_object_type(audit_objects::INTERFACE)
                        .with_details(json!({
                            "device_id": device.as_u64(),
                            "rolled_back": created.len(),
                        }))
                        .with_error(err.to_string())
                );
                Err(err)
            }
        }
    }

    /// Validates and performs the three writes of a split.
    ///
    /// Ids of interfaces created so far are pushed to `created` so the caller
    /// can undo them if a later step fails.
    fn try_split(
        &mut self,
        device: DeviceId,
        interface_name: &str,
        created: &mut Vec<InterfaceId>,
    ) -> IntfRelResult<RelationshipId> {
        let device_name = self
            .inventory
            .device(device)
            .map(|d| d.name.clone())
            .ok_or_else(|| IntfRelError::device_not_found(device))?;

        let original = self
            .inventory
            .interface_by_name(device, interface_name)
            .cloned()
            .ok_or_else(|| IntfRelError::interface_not_found(interface_name, &device_name))?;

        if let Some((role, existing)) = self.relationships.find_by_interface(original.id) {
            return Err(IntfRelError::constraint_violation(
                original.id,
                role,
                existing.id,
            ));
        }

        debug!(
            "Splitting interface {} ({}) on device {}",
            original.name, original.id, device_name
        );

        let rx = self.inventory.create_interface(
            NewInterface::new(device, rx_name(&original.name), original.kind.clone())
                .with_parent(original.id)
                .with_description(rx_description(&original.name)),
        )?;
        created.push(rx);

        let tx = self.inventory.create_interface(
            NewInterface::new(device, tx_name(&original.name), original.kind.clone())
                .with_parent(original.id)
                .with_description(tx_description(&original.name)),
        )?;
        created.push(tx);

        self.relationships.create(original.id, rx, tx)
    }

    /// Deletes interfaces created by a failed split, newest first.
    ///
    /// Returns a description of what could not be deleted, if anything.
    fn roll_back(&mut self, created: &[InterfaceId]) -> Option<String> {
        let mut failures = Vec::new();

        for id in created.iter().rev() {
            match self.inventory.delete_interface(*id) {
                Ok(removed) => {
                    self.stats.interfaces_rolled_back += 1;
                    debug!("Rolled back interface {} ({})", removed.name, id);
                    audit_log!(
                        AuditRecord::new(AuditCategory::Rollback, SOURCE, "undo_split")
                            .with_outcome(AuditOutcome::Success)
                            .with_object_id(removed.name)
                            .with_object_type(audit_objects::INTERFACE)
                    );
                }
                Err(e) => {
                    error!("Failed to roll back interface {}: {}", id, e);
                    failures.push(e.to_string());
                }
            }
        }

        if failures.is_empty() {
            None
        } else {
            Some(failures.join("; "))
        }
    }

    /// Splits an interface chosen by id from the device's candidate list.
    ///
    /// The candidate list is fetched again here; an id that is not on it
    /// (unknown, on another device, or already split) is reported as
    /// not found. Returns the acknowledgement shown to the operator.
    pub fn split_selected(
        &mut self,
        device: DeviceId,
        interface: InterfaceId,
    ) -> IntfRelResult<String> {
        let device_name = self
            .inventory
            .device(device)
            .map(|d| d.name.clone())
            .ok_or_else(|| IntfRelError::device_not_found(device))?;

        let selected = self
            .candidates(device)?
            .into_iter()
            .find(|intf| intf.id == interface)
            .ok_or_else(|| IntfRelError::not_found(SELECTION_UNAVAILABLE))?;

        self.split_interface(device, &selected.name)?;

        Ok(format!(
            "Successfully split interface '{}' for device '{}'.",
            selected.name, device_name
        ))
    }

    /// Deletes an interface and every relationship referencing it.
    ///
    /// Interfaces that still have children (e.g. a main interface whose RX
    /// and TX interfaces exist) are refused by the inventory.
    pub fn delete_interface(&mut self, interface: InterfaceId) -> IntfRelResult<Interface> {
        let removed = match self.inventory.delete_interface(interface) {
            Ok(removed) => removed,
            Err(e) => {
                audit_log!(
                    AuditRecord::new(AuditCategory::ResourceDelete, SOURCE, "delete_interface")
                        .with_object_id(interface.to_string())
                        .with_object_type(audit_objects::INTERFACE)
                        .with_error(e.to_string())
                );
                return Err(e.into());
            }
        };

        info!(
            "Deleted interface {} ({}) from device {}",
            removed.name, interface, removed.device
        );
        audit_log!(
            AuditRecord::new(AuditCategory::ResourceDelete, SOURCE, "delete_interface")
                .with_outcome(AuditOutcome::Success)
                .with_object_id(removed.name.clone())
                .with_object_type(audit_objects::INTERFACE)
        );

        for relationship in self.relationships.remove_for_interface(interface) {
            self.stats.relationships_cascaded += 1;
            info!(
                "Removed relationship {} after deleting interface {}",
                relationship.id, removed.name
            );
            audit_log!(
                AuditRecord::new(AuditCategory::ResourceDelete, SOURCE, "cascade_relationship")
                    .with_outcome(AuditOutcome::Success)
                    .with_object_id(relationship.id.to_string())
                    .with_object_type(audit_objects::RELATIONSHIP)
                    .with_details(json!({
                        "main_interface": relationship.main_interface.as_u64(),
                        "rx_interface": relationship.rx_interface.as_u64(),
                        "tx_interface": relationship.tx_interface.as_u64(),
                    }))
            );
        }

        Ok(removed)
    }

    /// Renders a relationship using interface names, e.g. `eth0 -> eth0_rx, eth0_tx`.
    pub fn describe(&self, relationship: &InterfaceRelationship) -> String {
        let name = |id: InterfaceId| {
            self.inventory
                .interface(id)
                .map(|intf| intf.name.clone())
                .unwrap_or_else(|| format!("#{}", id))
        };
        format!(
            "{} -> {}, {}",
            name(relationship.main_interface),
            name(relationship.rx_interface),
            name(relationship.tx_interface)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationship::RelationshipRole;
    use pretty_assertions::assert_eq;
    use sonic_inventory::{InterfaceType, InventoryError, InventoryResult};

    fn mgr_with(names: &[&str]) -> (IntfRelMgr, DeviceId) {
        let mut mgr = IntfRelMgr::in_memory();
        let dev = mgr.add_device("leaf01");
        for name in names {
            mgr.add_interface(NewInterface::new(dev, *name, InterfaceType::new("1000base-t")))
                .unwrap();
        }
        (mgr, dev)
    }

    #[test]
    fn test_split_creates_children_and_relationship() {
        let (mut mgr, dev) = mgr_with(&["eth0"]);
        let rel_id = mgr.split_interface(dev, "eth0").unwrap();

        let inv = mgr.inventory();
        let eth0 = inv.interface_by_name(dev, "eth0").unwrap();
        let rx = inv.interface_by_name(dev, "eth0_rx").unwrap();
        let tx = inv.interface_by_name(dev, "eth0_tx").unwrap();

        assert_eq!(rx.parent, Some(eth0.id));
        assert_eq!(tx.parent, Some(eth0.id));
        assert_eq!(rx.kind, eth0.kind);
        assert_eq!(rx.description, "RX interface for eth0");
        assert_eq!(tx.description, "TX interface for eth0");

        let rel = mgr.relationships().get(rel_id).unwrap();
        assert_eq!(rel.interfaces(), [eth0.id, rx.id, tx.id]);
        assert_eq!(mgr.describe(rel), "eth0 -> eth0_rx, eth0_tx");
        assert_eq!(mgr.stats().splits_succeeded, 1);
        assert_eq!(mgr.stats().interfaces_created, 2);
    }

    #[test]
    fn test_second_split_fails() {
        let (mut mgr, dev) = mgr_with(&["eth0"]);
        mgr.split_interface(dev, "eth0").unwrap();

        let err = mgr.split_interface(dev, "eth0").unwrap_err();
        assert!(err.is_operation_failed());
        assert!(err.is_constraint_violation());
        assert_eq!(mgr.relationships().len(), 1);
        assert_eq!(mgr.inventory().interface_count(), 3);
        assert_eq!(mgr.stats().splits_failed, 1);
    }

    #[test]
    fn test_derived_interfaces_cannot_be_split() {
        let (mut mgr, dev) = mgr_with(&["eth0"]);
        mgr.split_interface(dev, "eth0").unwrap();

        for name in ["eth0_rx", "eth0_tx"] {
            let err = mgr.split_interface(dev, name).unwrap_err();
            match err.root_cause() {
                IntfRelError::ConstraintViolation { role, .. } => {
                    assert_ne!(*role, RelationshipRole::Main);
                }
                other => panic!("unexpected cause: {other}"),
            }
        }
        assert!(mgr.inventory().interface_by_name(dev, "eth0_rx_rx").is_none());
    }

    #[test]
    fn test_missing_interface_and_device() {
        let (mut mgr, dev) = mgr_with(&["eth0"]);

        let err = mgr.split_interface(dev, "eth9").unwrap_err();
        assert!(err.is_operation_failed());
        assert!(err.is_not_found());
        assert!(err
            .to_string()
            .contains("Interface 'eth9' not found for device leaf01."));

        let err = mgr.split_interface(DeviceId::new(999), "eth0").unwrap_err();
        assert!(err.is_not_found());
        assert!(mgr.relationships().is_empty());
    }

    #[test]
    fn test_name_collision_rolls_back() {
        // eth0_tx already exists, so the second create fails after eth0_rx
        // was created.
        let (mut mgr, dev) = mgr_with(&["eth0", "eth0_tx"]);

        let err = mgr.split_interface(dev, "eth0").unwrap_err();
        assert!(err.is_operation_failed());
        assert!(matches!(
            err.root_cause(),
            IntfRelError::Inventory(InventoryError::DuplicateInterfaceName { .. })
        ));

        assert!(mgr.inventory().interface_by_name(dev, "eth0_rx").is_none());
        assert_eq!(mgr.inventory().interface_count(), 2);
        assert_eq!(mgr.stats().interfaces_rolled_back, 1);
        assert!(mgr.relationships().is_empty());
    }

    #[test]
    fn test_split_selected() {
        let (mut mgr, dev) = mgr_with(&["eth0", "eth1"]);
        let eth1 = mgr.inventory().interface_by_name(dev, "eth1").unwrap().id;

        let msg = mgr.split_selected(dev, eth1).unwrap();
        assert_eq!(msg, "Successfully split interface 'eth1' for device 'leaf01'.");

        let err = mgr.split_selected(dev, eth1).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), SELECTION_UNAVAILABLE);
    }

    #[test]
    fn test_delete_cascades_relationship() {
        let (mut mgr, dev) = mgr_with(&["eth0"]);
        mgr.split_interface(dev, "eth0").unwrap();
        let eth0 = mgr.inventory().interface_by_name(dev, "eth0").unwrap().id;
        let rx = mgr.inventory().interface_by_name(dev, "eth0_rx").unwrap().id;

        // Main still has children.
        let err = mgr.delete_interface(eth0).unwrap_err();
        assert!(matches!(
            err,
            IntfRelError::Inventory(InventoryError::HasChildInterfaces { .. })
        ));
        assert_eq!(mgr.relationships().len(), 1);

        mgr.delete_interface(rx).unwrap();
        assert!(mgr.relationships().is_empty());
        assert_eq!(mgr.stats().relationships_cascaded, 1);

        let names: Vec<String> = mgr
            .candidates(dev)
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["eth0".to_string(), "eth0_tx".to_string()]);
    }

    /// Store whose inserts always fail, to exercise rollback after both
    /// interfaces exist.
    #[derive(Default)]
    struct RejectingStore;

    impl RelationshipStore for RejectingStore {
        fn create(
            &mut self,
            main: InterfaceId,
            _rx: InterfaceId,
            _tx: InterfaceId,
        ) -> IntfRelResult<RelationshipId> {
            Err(IntfRelError::constraint_violation(
                main,
                RelationshipRole::Main,
                RelationshipId::new(1),
            ))
        }

        fn list_all(&self) -> Vec<&InterfaceRelationship> {
            Vec::new()
        }

        fn get(&self, _id: RelationshipId) -> Option<&InterfaceRelationship> {
            None
        }

        fn find_by_interface(
            &self,
            _interface: InterfaceId,
        ) -> Option<(RelationshipRole, &InterfaceRelationship)> {
            None
        }

        fn remove_for_interface(&mut self, _interface: InterfaceId) -> Vec<InterfaceRelationship> {
            Vec::new()
        }

        fn len(&self) -> usize {
            0
        }
    }

    #[test]
    fn test_relationship_insert_failure_rolls_back_both() {
        let mut inv = MemoryInventory::new();
        let dev = inv.add_device("leaf01");
        inv.create_interface(NewInterface::new(dev, "eth0", InterfaceType::default()))
            .unwrap();
        let mut mgr = IntfRelMgr::new(inv, RejectingStore);

        let err = mgr.split_interface(dev, "eth0").unwrap_err();
        assert!(err.is_constraint_violation());
        assert_eq!(mgr.inventory().interface_count(), 1);
        assert_eq!(mgr.stats().interfaces_rolled_back, 2);
    }

    /// Inventory wrapper whose deletes fail, to exercise cleanup reporting.
    struct StickyInventory(MemoryInventory);

    impl Inventory for StickyInventory {
        fn device(&self, id: DeviceId) -> Option<&Device> {
            self.0.device(id)
        }
        fn devices(&self) -> Vec<&Device> {
            self.0.devices()
        }
        fn interface(&self, id: InterfaceId) -> Option<&Interface> {
            self.0.interface(id)
        }
        fn interface_by_name(&self, device: DeviceId, name: &str) -> Option<&Interface> {
            self.0.interface_by_name(device, name)
        }
        fn interfaces_for_device(&self, device: DeviceId) -> Vec<&Interface> {
            self.0.interfaces_for_device(device)
        }
        fn children(&self, parent: InterfaceId) -> Vec<&Interface> {
            self.0.children(parent)
        }
        fn create_interface(&mut self, new: NewInterface) -> InventoryResult<InterfaceId> {
            self.0.create_interface(new)
        }
        fn delete_interface(&mut self, id: InterfaceId) -> InventoryResult<Interface> {
            Err(InventoryError::InterfaceNotFound(id))
        }
    }

    #[test]
    fn test_cleanup_failure_is_reported() {
        let mut inv = MemoryInventory::new();
        let dev = inv.add_device("leaf01");
        inv.create_interface(NewInterface::new(dev, "eth0", InterfaceType::default()))
            .unwrap();
        let mut mgr = IntfRelMgr::new(StickyInventory(inv), RejectingStore);

        let err = mgr.split_interface(dev, "eth0").unwrap_err();
        match &err {
            IntfRelError::OperationFailed { cleanup, .. } => assert!(cleanup.is_some()),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("cleanup failed"));
    }
}
