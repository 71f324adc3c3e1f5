//! Interface Relationship Manager - splits interfaces into linked RX/TX pairs
//!
//! intfrelmgrd manages derived RX/TX interfaces in the network inventory:
//! - Splitting an interface into `<name>_rx` and `<name>_tx` children
//! - Recording the main/rx/tx relationship, unique per role
//! - Listing the interfaces that can still be split
//! - Removing relationships when one of their interfaces is deleted
//! - Persisting inventory state between invocations
//!
//! A failed split never leaves derived interfaces behind: anything created
//! before the failure is deleted again before the error is returned.

pub mod audit;
pub mod config_file;
pub mod eligibility;
pub mod error;
pub mod intf_rel_mgr;
pub mod relationship;
pub mod snapshot;
pub mod tables;

pub use audit::{init_logging, AuditCategory, AuditOutcome, AuditRecord};
pub use config_file::IntfRelConfig;
pub use eligibility::{eligible_interfaces, used_interface_ids};
pub use error::{IntfRelError, IntfRelResult};
pub use intf_rel_mgr::{IntfRelMgr, IntfRelMgrStats};
pub use relationship::{
    InterfaceRelationship, MemoryRelationshipStore, RelationshipId, RelationshipRole,
    RelationshipStore,
};
pub use snapshot::InventorySnapshot;
