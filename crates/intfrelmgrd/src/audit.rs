//! Audit records and logging setup.
//!
//! Every change the manager makes to the inventory (split, rollback, delete,
//! cascade) produces an [`AuditRecord`] that is emitted through the
//! [`audit_log!`](crate::audit_log) macro on the `audit` tracing target. The
//! record carries a JSON rendering so log shippers can index it without
//! parsing the human-readable message.
//!
//! # Usage
//! ```ignore
//! let record = AuditRecord::new(AuditCategory::ResourceCreate, "IntfRelMgr", "split_interface")
//!     .with_outcome(AuditOutcome::Success)
//!     .with_object_id("eth0")
//!     .with_object_type("interface_relationship");
//! audit_log!(record);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Audit event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditCategory {
    /// Inventory records created (derived interfaces, relationships)
    ResourceCreate,
    /// Inventory records deleted (interfaces, cascaded relationships)
    ResourceDelete,
    /// Compensating deletes after a failed split
    Rollback,
    /// Operator-driven actions through the selection surface
    AdminAction,
    /// Error and failure events
    ErrorCondition,
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditCategory::ResourceCreate => write!(f, "RESOURCE_CREATE"),
            AuditCategory::ResourceDelete => write!(f, "RESOURCE_DELETE"),
            AuditCategory::Rollback => write!(f, "ROLLBACK"),
            AuditCategory::AdminAction => write!(f, "ADMIN_ACTION"),
            AuditCategory::ErrorCondition => write!(f, "ERROR_CONDITION"),
        }
    }
}

/// Outcome of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    /// Action completed successfully
    Success,
    /// Action failed
    Failure,
    /// Action is in progress
    InProgress,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Success => write!(f, "success"),
            AuditOutcome::Failure => write!(f, "failure"),
            AuditOutcome::InProgress => write!(f, "in_progress"),
        }
    }
}

/// Structured audit record.
///
/// Built once with the `with_*` methods and then handed to `audit_log!`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// UTC timestamp of record creation
    pub timestamp: DateTime<Utc>,

    pub category: AuditCategory,

    /// Component generating the event (e.g. "IntfRelMgr")
    pub source: String,

    /// Operation performed (e.g. "split_interface")
    pub action: String,

    pub outcome: AuditOutcome,

    /// Affected object, e.g. an interface name or relationship id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    /// "interface" or "interface_relationship"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Error message if outcome is failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditRecord {
    /// Create a new audit record with the current timestamp.
    ///
    /// The outcome defaults to InProgress until explicitly set.
    pub fn new(
        category: AuditCategory,
        source: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            category,
            source: source.into(),
            action: action.into(),
            outcome: AuditOutcome::InProgress,
            object_id: None,
            object_type: None,
            details: None,
            error: None,
        }
    }

    /// Set the outcome of the action.
    pub fn with_outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Set the object identifier affected by the action.
    pub fn with_object_id(mut self, id: impl Into<String>) -> Self {
        self.object_id = Some(id.into());
        self
    }

    /// Set the object type.
    pub fn with_object_type(mut self, obj_type: impl Into<String>) -> Self {
        self.object_type = Some(obj_type.into());
        self
    }

    /// Add structured context.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Set the error message and mark outcome as Failure.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self.outcome = AuditOutcome::Failure;
        self
    }

    /// Convert to a JSON string for logging.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"serialization_failed","message":"{}"}}"#, e))
    }
}

/// Emits an [`AuditRecord`] on the `audit` target.
///
/// Success is logged at info, in-progress at debug, failure at warn.
#[macro_export]
macro_rules! audit_log {
    ($record:expr) => {
        let record = $record;
        match record.outcome {
            $crate::audit::AuditOutcome::Success => {
                tracing::info!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
            $crate::audit::AuditOutcome::InProgress => {
                tracing::debug!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
            $crate::audit::AuditOutcome::Failure => {
                tracing::warn!(
                    target: "audit",
                    category = %record.category,
                    source = %record.source,
                    action = %record.action,
                    outcome = %record.outcome,
                    error = record.error.as_deref().unwrap_or(""),
                    audit_json = %record.to_json(),
                    "AUDIT: {} - {} - {}",
                    record.category,
                    record.action,
                    record.outcome
                );
            }
        }
    };
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `log_level`. With `json` set, events are
/// written as JSON lines; otherwise a human-readable format is used.
pub fn init_logging(log_level: &str, json: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_record_creation() {
        let record = AuditRecord::new(AuditCategory::ResourceCreate, "IntfRelMgr", "split_interface")
            .with_outcome(AuditOutcome::Success)
            .with_object_id("eth0")
            .with_object_type("interface_relationship");

        assert_eq!(record.category, AuditCategory::ResourceCreate);
        assert_eq!(record.source, "IntfRelMgr");
        assert_eq!(record.outcome, AuditOutcome::Success);
        assert_eq!(record.object_id.as_deref(), Some("eth0"));
    }

    #[test]
    fn test_audit_record_with_error() {
        let record = AuditRecord::new(AuditCategory::ErrorCondition, "IntfRelMgr", "split_interface")
            .with_error("Interface 'eth9' not found for device leaf01.");

        assert_eq!(record.outcome, AuditOutcome::Failure);
        assert!(record.error.unwrap().contains("eth9"));
    }

    #[test]
    fn test_audit_record_json_serialization() {
        let record = AuditRecord::new(AuditCategory::Rollback, "IntfRelMgr", "undo_split")
            .with_outcome(AuditOutcome::Success)
            .with_details(serde_json::json!({ "interfaces": ["eth0_rx"] }));

        let json = record.to_json();
        assert!(json.contains("\"category\":\"ROLLBACK\""));
        assert!(json.contains("undo_split"));
        assert!(json.contains("\"interfaces\":[\"eth0_rx\"]"));
        assert!(!json.contains("object_id"));
    }

    #[test]
    fn test_display() {
        assert_eq!(AuditCategory::ResourceDelete.to_string(), "RESOURCE_DELETE");
        assert_eq!(AuditOutcome::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn test_audit_log_macro_without_subscriber() {
        audit_log!(AuditRecord::new(AuditCategory::AdminAction, "test", "noop")
            .with_outcome(AuditOutcome::Success));
    }
}
