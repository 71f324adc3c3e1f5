//! Device and interface inventory for the interface relationship manager.
//!
//! This crate models the part of the network inventory that the relationship
//! manager reads from and writes to:
//!
//! - [`Device`]: a managed device, identified by [`DeviceId`]
//! - [`Interface`]: an interface attached to a device, identified by [`InterfaceId`]
//! - [`InterfaceType`]: free-form interface type label (e.g. `1000base-t`)
//! - [`Inventory`]: the lookup/create/delete contract the manager depends on
//! - [`MemoryInventory`]: in-memory implementation used by the daemon and tests
//!
//! # Example
//!
//! ```
//! use sonic_inventory::{Inventory, InterfaceType, MemoryInventory, NewInterface};
//!
//! let mut inv = MemoryInventory::new();
//! let dev = inv.add_device("leaf01");
//! let eth0 = inv
//!     .create_interface(NewInterface::new(dev, "eth0", InterfaceType::new("1000base-t")))
//!     .unwrap();
//!
//! assert_eq!(inv.interface_by_name(dev, "eth0").map(|i| i.id), Some(eth0));
//! assert!(inv.interface_by_name(dev, "eth1").is_none());
//! ```

mod error;
mod store;
mod types;

pub use error::{InventoryError, InventoryResult};
pub use store::{Inventory, MemoryInventory};
pub use types::{Device, DeviceId, Interface, InterfaceId, InterfaceType, NewInterface};
