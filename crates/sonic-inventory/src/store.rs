//! Inventory store contract and in-memory implementation.
//!
//! Lookups return `Option` and never create records. All writes are explicit
//! and validated: interface names are unique per device, parents must exist on
//! the same device, and an interface with children cannot be deleted.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::{InventoryError, InventoryResult};
use crate::types::{Device, DeviceId, Interface, InterfaceId, NewInterface};

/// Lookup and write contract the relationship manager needs from the
/// surrounding inventory.
pub trait Inventory {
    /// Gets a device by id.
    fn device(&self, id: DeviceId) -> Option<&Device>;

    /// Returns all devices ordered by name.
    fn devices(&self) -> Vec<&Device>;

    /// Gets an interface by id.
    fn interface(&self, id: InterfaceId) -> Option<&Interface>;

    /// Gets an interface by its per-device name.
    fn interface_by_name(&self, device: DeviceId, name: &str) -> Option<&Interface>;

    /// Returns the interfaces attached to a device, in id order.
    fn interfaces_for_device(&self, device: DeviceId) -> Vec<&Interface>;

    /// Returns the interfaces whose parent is `parent`.
    fn children(&self, parent: InterfaceId) -> Vec<&Interface>;

    /// Creates an interface and returns its assigned id.
    fn create_interface(&mut self, new: NewInterface) -> InventoryResult<InterfaceId>;

    /// Deletes an interface and returns the removed record.
    fn delete_interface(&mut self, id: InterfaceId) -> InventoryResult<Interface>;
}

/// In-memory inventory.
///
/// Ids are assigned monotonically and never reused, also after deletes.
#[derive(Debug, Clone, Default)]
pub struct MemoryInventory {
    devices: BTreeMap<DeviceId, Device>,
    interfaces: BTreeMap<InterfaceId, Interface>,
    /// (device, name) -> interface id
    name_index: HashMap<(DeviceId, String), InterfaceId>,
    next_device_id: u64,
    next_interface_id: u64,
}

impl MemoryInventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self {
            next_device_id: 1,
            next_interface_id: 1,
            ..Default::default()
        }
    }

    /// Adds a device and returns its id.
    pub fn add_device(&mut self, name: impl Into<String>) -> DeviceId {
        let id = DeviceId::new(self.next_device_id.max(1));
        self.next_device_id = id.as_u64() + 1;

        let device = Device {
            id,
            name: name.into(),
        };
        debug!("Added device {} ({})", device.name, id);
        self.devices.insert(id, device);
        id
    }

    /// Restores a device with a fixed id (used when loading a snapshot).
    pub fn restore_device(&mut self, device: Device) -> InventoryResult<()> {
        if self.devices.contains_key(&device.id) {
            return Err(InventoryError::DuplicateId {
                kind: "device",
                id: device.id.as_u64(),
            });
        }
        self.next_device_id = self.next_device_id.max(device.id.as_u64() + 1);
        self.devices.insert(device.id, device);
        Ok(())
    }

    /// Restores an interface with a fixed id (used when loading a snapshot).
    ///
    /// Parents must be restored before their children.
    pub fn restore_interface(&mut self, interface: Interface) -> InventoryResult<()> {
        if self.interfaces.contains_key(&interface.id) {
            return Err(InventoryError::DuplicateId {
                kind: "interface",
                id: interface.id.as_u64(),
            });
        }
        self.validate_placement(interface.device, &interface.name, interface.parent)?;

        self.next_interface_id = self.next_interface_id.max(interface.id.as_u64() + 1);
        self.name_index
            .insert((interface.device, interface.name.clone()), interface.id);
        self.interfaces.insert(interface.id, interface);
        Ok(())
    }

    /// Returns all interfaces in id order.
    pub fn all_interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.values()
    }

    /// Returns the number of devices.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Returns the number of interfaces.
    pub fn interface_count(&self) -> usize {
        self.interfaces.len()
    }

    fn validate_placement(
        &self,
        device: DeviceId,
        name: &str,
        parent: Option<InterfaceId>,
    ) -> InventoryResult<()> {
        if !self.devices.contains_key(&device) {
            return Err(InventoryError::DeviceNotFound(device));
        }
        if self.name_index.contains_key(&(device, name.to_string())) {
            return Err(InventoryError::DuplicateInterfaceName {
                device,
                name: name.to_string(),
            });
        }
        if let Some(parent) = parent {
            let parent_intf = self
                .interfaces
                .get(&parent)
                .ok_or(InventoryError::ParentNotFound(parent))?;
            if parent_intf.device != device {
                return Err(InventoryError::ParentOnOtherDevice { parent, device });
            }
        }
        Ok(())
    }
}

impl Inventory for MemoryInventory {
    fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    fn devices(&self) -> Vec<&Device> {
        let mut devices: Vec<&Device> = self.devices.values().collect();
        devices.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        devices
    }

    fn interface(&self, id: InterfaceId) -> Option<&Interface> {
        self.interfaces.get(&id)
    }

    fn interface_by_name(&self, device: DeviceId, name: &str) -> Option<&Interface> {
        self.name_index
            .get(&(device, name.to_string()))
            .and_then(|id| self.interfaces.get(id))
    }

    fn interfaces_for_device(&self, device: DeviceId) -> Vec<&Interface> {
        self.interfaces
            .values()
            .filter(|intf| intf.device == device)
            .collect()
    }

    fn children(&self, parent: InterfaceId) -> Vec<&Interface> {
        self.interfaces
            .values()
            .filter(|intf| intf.parent == Some(parent))
            .collect()
    }

    fn create_interface(&mut self, new: NewInterface) -> InventoryResult<InterfaceId> {
        self.validate_placement(new.device, &new.name, new.parent)?;

        let id = InterfaceId::new(self.next_interface_id.max(1));
        self.next_interface_id = id.as_u64() + 1;

        let interface = Interface {
            id,
            name: new.name,
            device: new.device,
            kind: new.kind,
            parent: new.parent,
            description: new.description,
        };

        debug!(
            "Created interface {} ({}) on device {}",
            interface.name, id, interface.device
        );
        self.name_index
            .insert((interface.device, interface.name.clone()), id);
        self.interfaces.insert(id, interface);
        Ok(id)
    }

    fn delete_interface(&mut self, id: InterfaceId) -> InventoryResult<Interface> {
        if !self.interfaces.contains_key(&id) {
            return Err(InventoryError::InterfaceNotFound(id));
        }

        let children = self.children(id).len();
        if children > 0 {
            return Err(InventoryError::HasChildInterfaces {
                interface: id,
                children,
            });
        }

        let interface = self
            .interfaces
            .remove(&id)
            .ok_or(InventoryError::InterfaceNotFound(id))?;
        self.name_index
            .remove(&(interface.device, interface.name.clone()));

        debug!(
            "Deleted interface {} ({}) from device {}",
            interface.name, id, interface.device
        );
        Ok(interface)
    }
}
