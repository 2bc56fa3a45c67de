//! USB interface-number recovery.
//!
//! On newer host releases the `InterfaceNumber` property is no longer
//! exposed on the HID device object itself; it moved to one of the device's
//! ancestors in the service plane. The exact depth is undocumented and
//! version-dependent, so when the direct read fails we walk a fixed, shallow
//! slice of the ancestry rather than the whole bus hierarchy.

use crate::registry::{PropertyKey, RegistryDevice, ServiceEntry};

/// Sentinel for "interface number could not be determined".
pub const INTERFACE_ID_UNKNOWN: i64 = -1;

/// How many ancestors the fallback walk visits. Fixed policy: deeper
/// ancestry belongs to unrelated bus topology.
const MAX_ANCESTOR_HOPS: usize = 3;

/// Resolves a device's USB interface number.
///
/// Tries the direct property first, then falls back to
/// [`walk_ancestors_for_interface_id`]. Returns [`INTERFACE_ID_UNKNOWN`]
/// when both fail.
pub fn resolve_interface_id<D: RegistryDevice>(device: &D) -> i64 {
    match device.int_property(PropertyKey::InterfaceNumber) {
        Some(id) => id,
        None => walk_ancestors_for_interface_id(device),
    }
}

/// Searches up to [`MAX_ANCESTOR_HOPS`] ancestors of the device's service
/// entry for a direct `InterfaceNumber` property.
///
/// Each hop reads the property non-recursively on the current entry; the
/// first hit wins. Running out of parents, or failing to reach the first
/// parent at all, yields [`INTERFACE_ID_UNKNOWN`]. Entry handles are owned
/// values, so every intermediate handle is released exactly once on every
/// exit path.
pub fn walk_ancestors_for_interface_id<D: RegistryDevice>(device: &D) -> i64 {
    let first = device.service_entry().and_then(|entry| entry.parent());
    let Some(mut current) = first else {
        return INTERFACE_ID_UNKNOWN;
    };

    for _ in 0..MAX_ANCESTOR_HOPS {
        if let Some(id) = current.int_property(PropertyKey::InterfaceNumber) {
            return id;
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return INTERFACE_ID_UNKNOWN,
        }
    }

    INTERFACE_ID_UNKNOWN
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::test_double::{FakeDevice, FakeNode};

    fn node(interface_number: Option<i64>) -> FakeNode {
        FakeNode { interface_number }
    }

    #[test]
    fn direct_property_wins() {
        let mut dev = FakeDevice::with_id(1);
        dev.set_int(PropertyKey::InterfaceNumber, 2);
        // Chain would report 9; the direct property must short-circuit.
        dev.set_chain(vec![node(None), node(Some(9))]);
        assert_eq!(resolve_interface_id(&dev), 2);
        assert!(dev.ledger.balanced());
    }

    #[test]
    fn no_service_entry_gives_unknown() {
        let dev = FakeDevice::with_id(1);
        assert_eq!(walk_ancestors_for_interface_id(&dev), INTERFACE_ID_UNKNOWN);
    }

    #[test]
    fn entry_without_parent_gives_unknown() {
        let mut dev = FakeDevice::with_id(1);
        // Only the service entry itself; no parent to start the walk from.
        dev.set_chain(vec![node(Some(7))]);
        assert_eq!(walk_ancestors_for_interface_id(&dev), INTERFACE_ID_UNKNOWN);
        assert!(dev.ledger.balanced());
    }

    #[test]
    fn finds_value_at_each_hop() {
        for hop in 1..=3 {
            let mut nodes = vec![node(None)]; // service entry
            for _ in 1..hop {
                nodes.push(node(None));
            }
            nodes.push(node(Some(5)));
            // Anything past the hit must not be visited.
            nodes.push(node(Some(99)));

            let mut dev = FakeDevice::with_id(1);
            dev.set_chain(nodes);
            assert_eq!(walk_ancestors_for_interface_id(&dev), 5, "hop {hop}");
            assert!(dev.ledger.balanced(), "hop {hop}");
        }
    }

    #[test]
    fn stops_after_three_hops() {
        // Value sits at the fourth ancestor: out of reach.
        let mut dev = FakeDevice::with_id(1);
        dev.set_chain(vec![
            node(None), // service entry
            node(None), // hop 1
            node(None), // hop 2
            node(None), // hop 3
            node(Some(5)),
        ]);
        assert_eq!(walk_ancestors_for_interface_id(&dev), INTERFACE_ID_UNKNOWN);
        assert!(dev.ledger.balanced());
    }

    #[test]
    fn exhausted_chain_gives_unknown() {
        let mut dev = FakeDevice::with_id(1);
        dev.set_chain(vec![node(None), node(None)]);
        assert_eq!(walk_ancestors_for_interface_id(&dev), INTERFACE_ID_UNKNOWN);
        assert!(dev.ledger.balanced());
    }

    #[test]
    fn handles_released_once_on_success() {
        let mut dev = FakeDevice::with_id(1);
        dev.set_chain(vec![node(None), node(None), node(Some(3))]);
        assert_eq!(walk_ancestors_for_interface_id(&dev), 3);
        // service entry + two ancestors acquired, all released
        assert_eq!(dev.ledger.acquired.get(), 3);
        assert_eq!(dev.ledger.released.get(), 3);
    }
}
