//! Error types for inventory operations.

use crate::types::{DeviceId, InterfaceId};
use thiserror::Error;

/// Result type alias for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Errors raised by an [`Inventory`](crate::Inventory) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// Referenced device does not exist.
    #[error("Device {0} not found")]
    DeviceNotFound(DeviceId),

    /// Referenced interface does not exist.
    #[error("Interface {0} not found")]
    InterfaceNotFound(InterfaceId),

    /// An interface with this name already exists on the device.
    #[error("Interface '{name}' already exists on device {device}")]
    DuplicateInterfaceName {
        /// The device the name collides on.
        device: DeviceId,
        /// The colliding name.
        name: String,
    },

    /// A record was restored with an id that is already taken.
    #[error("Duplicate {kind} id {id}")]
    DuplicateId {
        /// "device" or "interface".
        kind: &'static str,
        /// The duplicated raw id.
        id: u64,
    },

    /// Parent interface does not exist.
    #[error("Parent interface {0} not found")]
    ParentNotFound(InterfaceId),

    /// Parent interface belongs to another device.
    #[error("Parent interface {parent} is not attached to device {device}")]
    ParentOnOtherDevice {
        /// The requested parent.
        parent: InterfaceId,
        /// The device of the interface being created.
        device: DeviceId,
    },

    /// Interface still has child interfaces and cannot be deleted.
    #[error("Interface {interface} still has {children} child interface(s)")]
    HasChildInterfaces {
        /// The interface that was to be deleted.
        interface: InterfaceId,
        /// Number of remaining children.
        children: usize,
    },
}

impl InventoryError {
    /// Returns true if this error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            InventoryError::DeviceNotFound(_)
                | InventoryError::InterfaceNotFound(_)
                | InventoryError::ParentNotFound(_)
        )
    }
}
