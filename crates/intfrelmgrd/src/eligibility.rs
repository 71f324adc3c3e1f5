//! Split candidate selection.
//!
//! An interface is eligible for a split only if it has never taken part in
//! any relationship, in any role. The exclusion set is rebuilt from the store
//! on every call; nothing here is cached.

use std::collections::HashSet;

use sonic_inventory::{DeviceId, Interface, InterfaceId, Inventory};

use crate::error::{IntfRelError, IntfRelResult};
use crate::relationship::RelationshipStore;

/// Collects every interface id appearing as main, rx or tx in any relationship.
pub fn used_interface_ids<S>(relationships: &S) -> HashSet<InterfaceId>
where
    S: RelationshipStore + ?Sized,
{
    relationships
        .list_all()
        .into_iter()
        .flat_map(|rel| rel.interfaces())
        .collect()
}

/// Returns the interfaces of `device` that are not part of any relationship,
/// sorted by name.
pub fn eligible_interfaces<I, S>(
    inventory: &I,
    relationships: &S,
    device: DeviceId,
) -> IntfRelResult<Vec<Interface>>
where
    I: Inventory + ?Sized,
    S: RelationshipStore + ?Sized,
{
    if inventory.device(device).is_none() {
        return Err(IntfRelError::device_not_found(device));
    }

    let used = used_interface_ids(relationships);

    let mut eligible: Vec<Interface> = inventory
        .interfaces_for_device(device)
        .into_iter()
        .filter(|intf| !used.contains(&intf.id))
        .cloned()
        .collect();
    eligible.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(eligible)
}
