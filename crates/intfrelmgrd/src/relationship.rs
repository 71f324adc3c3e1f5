//! Relationship store: which interfaces have been split into RX/TX pairs.
//!
//! A relationship binds one main interface to exactly one RX and one TX
//! interface. Each role is independently unique: an interface can be the main
//! interface of at most one relationship, the RX interface of at most one, and
//! the TX interface of at most one. The in-memory store keeps one index per
//! role so the checks never scan the table.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sonic_inventory::InterfaceId;
use tracing::debug;

use crate::error::{IntfRelError, IntfRelResult};

/// Primary key of a relationship row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(u64);

impl RelationshipId {
    /// Creates a relationship id from its raw value.
    pub const fn new(id: u64) -> Self {
        RelationshipId(id)
    }

    /// Returns the raw id.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role an interface plays in a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipRole {
    /// The original interface that was split.
    Main,
    /// The derived receive interface.
    Rx,
    /// The derived transmit interface.
    Tx,
}

impl RelationshipRole {
    /// All roles, in lookup order.
    pub const ALL: [RelationshipRole; 3] = [
        RelationshipRole::Main,
        RelationshipRole::Rx,
        RelationshipRole::Tx,
    ];

    /// Returns the role name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RelationshipRole::Main => "main",
            RelationshipRole::Rx => "rx",
            RelationshipRole::Tx => "tx",
        }
    }
}

impl fmt::Display for RelationshipRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRelationship {
    pub id: RelationshipId,
    pub main_interface: InterfaceId,
    pub rx_interface: InterfaceId,
    pub tx_interface: InterfaceId,
    pub created_at: DateTime<Utc>,
}

impl InterfaceRelationship {
    /// Returns the interface holding `role`.
    pub fn interface(&self, role: RelationshipRole) -> InterfaceId {
        match role {
            RelationshipRole::Main => self.main_interface,
            RelationshipRole::Rx => self.rx_interface,
            RelationshipRole::Tx => self.tx_interface,
        }
    }

    /// Returns the (main, rx, tx) interfaces.
    pub fn interfaces(&self) -> [InterfaceId; 3] {
        [self.main_interface, self.rx_interface, self.tx_interface]
    }

    /// Returns the role `interface` plays here, if any.
    pub fn role_of(&self, interface: InterfaceId) -> Option<RelationshipRole> {
        RelationshipRole::ALL
            .into_iter()
            .find(|role| self.interface(*role) == interface)
    }
}

impl fmt::Display for InterfaceRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}, {}",
            self.main_interface, self.rx_interface, self.tx_interface
        )
    }
}

/// Durable bookkeeping of split interfaces.
pub trait RelationshipStore {
    /// Inserts a relationship.
    ///
    /// Fails with `ConstraintViolation` if any interface already holds its
    /// role in another relationship; nothing is written in that case.
    fn create(
        &mut self,
        main: InterfaceId,
        rx: InterfaceId,
        tx: InterfaceId,
    ) -> IntfRelResult<RelationshipId>;

    /// Returns every relationship. No ordering guarantee.
    fn list_all(&self) -> Vec<&InterfaceRelationship>;

    /// Gets a relationship by id.
    fn get(&self, id: RelationshipId) -> Option<&InterfaceRelationship>;

    /// Finds the first relationship referencing `interface` in any role,
    /// checking main, then rx, then tx.
    fn find_by_interface(
        &self,
        interface: InterfaceId,
    ) -> Option<(RelationshipRole, &InterfaceRelationship)>;

    /// Removes every relationship referencing `interface` in any role.
    ///
    /// This is the cascade hook run after an interface is deleted.
    fn remove_for_interface(&mut self, interface: InterfaceId) -> Vec<InterfaceRelationship>;

    /// Returns the number of relationships.
    fn len(&self) -> usize;

    /// Returns true if there are no relationships.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory relationship store with one unique index per role.
#[derive(Debug, Clone, Default)]
pub struct MemoryRelationshipStore {
    rows: BTreeMap<RelationshipId, InterfaceRelationship>,
    by_main: HashMap<InterfaceId, RelationshipId>,
    by_rx: HashMap<InterfaceId, RelationshipId>,
    by_tx: HashMap<InterfaceId, RelationshipId>,
    next_id: u64,
}

impl MemoryRelationshipStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Restores a relationship with a fixed id and timestamp (used when
    /// loading a snapshot). Enforces the same constraints as `create`.
    pub fn restore(&mut self, relationship: InterfaceRelationship) -> IntfRelResult<()> {
        if self.rows.contains_key(&relationship.id) {
            return Err(IntfRelError::Configuration(format!(
                "duplicate relationship id {}",
                relationship.id
            )));
        }
        self.check_free(&relationship)?;

        self.next_id = self.next_id.max(relationship.id.as_u64() + 1);
        self.insert_row(relationship);
        Ok(())
    }

    fn index(&self, role: RelationshipRole) -> &HashMap<InterfaceId, RelationshipId> {
        match role {
            RelationshipRole::Main => &self.by_main,
            RelationshipRole::Rx => &self.by_rx,
            RelationshipRole::Tx => &self.by_tx,
        }
    }

    fn index_mut(&mut self, role: RelationshipRole) -> &mut HashMap<InterfaceId, RelationshipId> {
        match role {
            RelationshipRole::Main => &mut self.by_main,
            RelationshipRole::Rx => &mut self.by_rx,
            RelationshipRole::Tx => &mut self.by_tx,
        }
    }

    /// Checks that every interface of `candidate` is free in its role and
    /// that the three interfaces are distinct.
    fn check_free(&self, candidate: &InterfaceRelationship) -> IntfRelResult<()> {
        for role in RelationshipRole::ALL {
            let interface = candidate.interface(role);
            if let Some(existing) = self.index(role).get(&interface) {
                return Err(IntfRelError::constraint_violation(interface, role, *existing));
            }
        }

        // Within one row an interface may only hold a single role.
        if candidate.rx_interface == candidate.main_interface {
            return Err(IntfRelError::constraint_violation(
                candidate.rx_interface,
                RelationshipRole::Main,
                candidate.id,
            ));
        }
        if candidate.tx_interface == candidate.main_interface
            || candidate.tx_interface == candidate.rx_interface
        {
            let role = candidate
                .role_of(candidate.tx_interface)
                .unwrap_or(RelationshipRole::Main);
            return Err(IntfRelError::constraint_violation(
                candidate.tx_interface,
                role,
                candidate.id,
            ));
        }

        Ok(())
    }

    fn insert_row(&mut self, relationship: InterfaceRelationship) {
        let id = relationship.id;
        for role in RelationshipRole::ALL {
            let interface = relationship.interface(role);
            self.index_mut(role).insert(interface, id);
        }
        self.rows.insert(id, relationship);
    }

    fn remove_row(&mut self, id: RelationshipId) -> Option<InterfaceRelationship> {
        let relationship = self.rows.remove(&id)?;
        for role in RelationshipRole::ALL {
            let interface = relationship.interface(role);
            self.index_mut(role).remove(&interface);
        }
        Some(relationship)
    }
}

impl RelationshipStore for MemoryRelationshipStore {
    fn create(
        &mut self,
        main: InterfaceId,
        rx: InterfaceId,
        tx: InterfaceId,
    ) -> IntfRelResult<RelationshipId> {
        let id = RelationshipId::new(self.next_id.max(1));
        let relationship = InterfaceRelationship {
            id,
            main_interface: main,
            rx_interface: rx,
            tx_interface: tx,
            created_at: Utc::now(),
        };

        self.check_free(&relationship)?;

        self.next_id = id.as_u64() + 1;
        debug!("Created relationship {}: {}", id, relationship);
        self.insert_row(relationship);
        Ok(id)
    }

    fn list_all(&self) -> Vec<&InterfaceRelationship> {
        self.rows.values().collect()
    }

    fn get(&self, id: RelationshipId) -> Option<&InterfaceRelationship> {
        self.rows.get(&id)
    }

    fn find_by_interface(
        &self,
        interface: InterfaceId,
    ) -> Option<(RelationshipRole, &InterfaceRelationship)> {
        RelationshipRole::ALL.into_iter().find_map(|role| {
            self.index(role)
                .get(&interface)
                .and_then(|id| self.rows.get(id))
                .map(|rel| (role, rel))
        })
    }

    fn remove_for_interface(&mut self, interface: InterfaceId) -> Vec<InterfaceRelationship> {
        let mut ids: Vec<RelationshipId> = RelationshipRole::ALL
            .into_iter()
            .filter_map(|role| self.index(role).get(&interface).copied())
            .collect();
        ids.sort();
        ids.dedup();

        ids.into_iter()
            .filter_map(|id| self.remove_row(id))
            .inspect(|rel| debug!("Removed relationship {} ({})", rel.id, rel))
            .collect()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(n: u64) -> InterfaceId {
        InterfaceId::new(n)
    }

    #[test]
    fn test_create_and_lookup() {
        let mut store = MemoryRelationshipStore::new();
        let rel = store.create(id(1), id(2), id(3)).unwrap();

        assert_eq!(store.len(), 1);
        let row = store.get(rel).unwrap();
        assert_eq!(row.interfaces(), [id(1), id(2), id(3)]);

        let (role, found) = store.find_by_interface(id(3)).unwrap();
        assert_eq!(role, RelationshipRole::Tx);
        assert_eq!(found.id, rel);
        assert!(store.find_by_interface(id(4)).is_none());
    }

    #[test]
    fn test_each_role_is_unique() {
        let mut store = MemoryRelationshipStore::new();
        let first = store.create(id(1), id(2), id(3)).unwrap();

        let err = store.create(id(1), id(5), id(6)).unwrap_err();
        assert!(matches!(
            err,
            IntfRelError::ConstraintViolation {
                role: RelationshipRole::Main,
                relationship,
                ..
            } if relationship == first
        ));

        let err = store.create(id(4), id(2), id(6)).unwrap_err();
        assert!(matches!(
            err,
            IntfRelError::ConstraintViolation {
                role: RelationshipRole::Rx,
                ..
            }
        ));

        let err = store.create(id(4), id(5), id(3)).unwrap_err();
        assert!(matches!(
            err,
            IntfRelError::ConstraintViolation {
                role: RelationshipRole::Tx,
                ..
            }
        ));

        // Failed inserts leave nothing behind.
        assert_eq!(store.len(), 1);
        assert!(store.find_by_interface(id(4)).is_none());
    }

    #[test]
    fn test_rejects_repeated_interface_in_one_row() {
        let mut store = MemoryRelationshipStore::new();
        assert!(store.create(id(1), id(1), id(2)).is_err());
        assert!(store.create(id(1), id(2), id(2)).is_err());
        assert!(store.create(id(1), id(2), id(1)).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_for_interface_cascades_any_role() {
        let mut store = MemoryRelationshipStore::new();
        store.create(id(1), id(2), id(3)).unwrap();
        store.create(id(10), id(11), id(12)).unwrap();

        let removed = store.remove_for_interface(id(11));
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].main_interface, id(10));

        assert_eq!(store.len(), 1);
        assert!(store.find_by_interface(id(10)).is_none());
        assert!(store.find_by_interface(id(12)).is_none());

        // Removed slots can be reused.
        store.create(id(10), id(13), id(14)).unwrap();
        assert!(store.remove_for_interface(id(99)).is_empty());
    }

    #[test]
    fn test_restore_enforces_constraints() {
        let mut store = MemoryRelationshipStore::new();
        let rel = InterfaceRelationship {
            id: RelationshipId::new(7),
            main_interface: id(1),
            rx_interface: id(2),
            tx_interface: id(3),
            created_at: Utc::now(),
        };
        store.restore(rel.clone()).unwrap();

        let mut clash = rel.clone();
        clash.id = RelationshipId::new(8);
        assert!(store.restore(clash).unwrap_err().to_string().contains("main"));

        assert!(store.restore(rel).is_err());

        let next = store.create(id(4), id(5), id(6)).unwrap();
        assert_eq!(next, RelationshipId::new(8));
    }

    #[test]
    fn test_role_of() {
        let mut store = MemoryRelationshipStore::new();
        let rel = store.create(id(1), id(2), id(3)).unwrap();
        let row = store.get(rel).unwrap();

        assert_eq!(row.role_of(id(1)), Some(RelationshipRole::Main));
        assert_eq!(row.role_of(id(2)), Some(RelationshipRole::Rx));
        assert_eq!(row.role_of(id(9)), None);
        assert_eq!(row.to_string(), "1 -> 2, 3");
    }
}
