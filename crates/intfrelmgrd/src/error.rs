//! Error types for interface relationship operations.
//!
//! All errors implement `std::error::Error` via `thiserror`. The split
//! operation never returns a bare cause: every failure is wrapped in
//! [`IntfRelError::OperationFailed`], and [`IntfRelError::root_cause`] recovers
//! the underlying variant.

use std::io;
use std::path::PathBuf;

use sonic_inventory::{DeviceId, InterfaceId, InventoryError};
use thiserror::Error;

use crate::relationship::{RelationshipId, RelationshipRole};

/// Result type alias for relationship manager operations.
pub type IntfRelResult<T> = Result<T, IntfRelError>;

/// Errors that can occur in the relationship manager.
#[derive(Debug, Error)]
pub enum IntfRelError {
    /// Device or interface does not exist.
    #[error("{message}")]
    NotFound {
        /// Human-readable description of what is missing.
        message: String,
    },

    /// Interface already occupies a role in an existing relationship.
    #[error("Interface {interface} is already the {role} interface of relationship {relationship}")]
    ConstraintViolation {
        /// The offending interface.
        interface: InterfaceId,
        /// The role it already holds.
        role: RelationshipRole,
        /// The relationship holding it.
        relationship: RelationshipId,
    },

    /// A split failed; carries the original cause.
    #[error("An error occurred during interface split: {source}{}", cleanup_note(.cleanup))]
    OperationFailed {
        /// The failure that aborted the split.
        source: Box<IntfRelError>,
        /// Set when undoing already created interfaces failed too.
        cleanup: Option<String>,
    },

    /// Inventory write failed.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// State snapshot could not be read, written or applied.
    #[error("Snapshot {}: {message}", .path.display())]
    Snapshot {
        /// The snapshot file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Configuration validation error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

fn cleanup_note(cleanup: &Option<String>) -> String {
    match cleanup {
        Some(msg) => format!(" (cleanup failed: {})", msg),
        None => String::new(),
    }
}

impl IntfRelError {
    /// Creates a not-found error for a device id.
    pub fn device_not_found(device: DeviceId) -> Self {
        Self::NotFound {
            message: format!("Device {} not found.", device),
        }
    }

    /// Creates a not-found error for an interface name on a device.
    pub fn interface_not_found(name: &str, device_name: &str) -> Self {
        Self::NotFound {
            message: format!("Interface '{}' not found for device {}.", name, device_name),
        }
    }

    /// Creates a not-found error with a custom message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a constraint violation error.
    pub fn constraint_violation(
        interface: InterfaceId,
        role: RelationshipRole,
        relationship: RelationshipId,
    ) -> Self {
        Self::ConstraintViolation {
            interface,
            role,
            relationship,
        }
    }

    /// Wraps a cause into an operation failure.
    pub fn operation_failed(cause: IntfRelError, cleanup: Option<String>) -> Self {
        Self::OperationFailed {
            source: Box::new(cause),
            cleanup,
        }
    }

    /// Creates a snapshot error.
    pub fn snapshot(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Snapshot {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the innermost error, looking through `OperationFailed`.
    pub fn root_cause(&self) -> &IntfRelError {
        match self {
            IntfRelError::OperationFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns true if the root cause is a missing device or interface.
    pub fn is_not_found(&self) -> bool {
        match self.root_cause() {
            IntfRelError::NotFound { .. } => true,
            IntfRelError::Inventory(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Returns true if the root cause is a relationship uniqueness violation.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self.root_cause(), IntfRelError::ConstraintViolation { .. })
    }

    /// Returns true if this is the umbrella split failure.
    pub fn is_operation_failed(&self) -> bool {
        matches!(self, IntfRelError::OperationFailed { .. })
    }
}
