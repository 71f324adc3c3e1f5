//! Naming, description and path constants

// Derived interface naming
pub const RX_SUFFIX: &str = "_rx";
pub const TX_SUFFIX: &str = "_tx";

// Derived interface descriptions
pub const RX_DESCRIPTION_PREFIX: &str = "RX interface for ";
pub const TX_DESCRIPTION_PREFIX: &str = "TX interface for ";

// Selection surface messages
pub const SELECTION_UNAVAILABLE: &str =
    "The selected interface does not exist or has already been split.";

// Audit object types
pub mod audit_objects {
    pub const INTERFACE: &str = "interface";
    pub const RELATIONSHIP: &str = "interface_relationship";
}

// Default locations
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sonic/intfrelmgrd.toml";
pub const DEFAULT_STATE_PATH: &str = "/var/lib/sonic/intfrelmgrd/inventory.json";
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Name of the RX interface derived from `main`.
pub fn rx_name(main: &str) -> String {
    format!("{}{}", main, RX_SUFFIX)
}

/// Name of the TX interface derived from `main`.
pub fn tx_name(main: &str) -> String {
    format!("{}{}", main, TX_SUFFIX)
}

/// Description of the RX interface derived from `main`.
pub fn rx_description(main: &str) -> String {
    format!("{}{}", RX_DESCRIPTION_PREFIX, main)
}

/// Description of the TX interface derived from `main`.
pub fn tx_description(main: &str) -> String {
    format!("{}{}", TX_DESCRIPTION_PREFIX, main)
}
