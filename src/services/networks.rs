//! Per-node network views

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{InterfaceId, NetworkGroup, NetworkGroupId, Node};

/// Allowed network ids of every interface, in interface order
pub fn allowed_network_ids(node: &Node) -> Vec<NetworkGroupId> {
    node.interfaces
        .iter()
        .flat_map(|i| i.allowed_networks.iter().copied())
        .collect()
}

/// Assigned network ids of every interface, in interface order
pub fn assigned_network_ids(node: &Node) -> Vec<NetworkGroupId> {
    node.interfaces
        .iter()
        .flat_map(|i| i.assigned_networks.iter().copied())
        .collect()
}

/// Network group reference as shown in interface views
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkRef {
    pub id: NetworkGroupId,
    /// `None` when the id does not resolve to a known group
    pub name: Option<String>,
}

/// Allowed and assigned networks of one interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceNetworks {
    pub interface_id: InterfaceId,
    pub name: String,
    pub allowed: Vec<NetworkRef>,
    pub assigned: Vec<NetworkRef>,
}

/// Allowed/assigned networks for each interface of `node`
pub fn interface_networks(
    node: &Node,
    groups: &BTreeMap<NetworkGroupId, NetworkGroup>,
) -> Vec<InterfaceNetworks> {
    let to_refs = |ids: &[NetworkGroupId]| -> Vec<NetworkRef> {
        ids.iter()
            .map(|id| NetworkRef {
                id: *id,
                name: groups.get(id).map(|g| g.name.clone()),
            })
            .collect()
    };

    node.interfaces
        .iter()
        .map(|i| InterfaceNetworks {
            interface_id: i.id,
            name: i.name.clone(),
            allowed: to_refs(&i.allowed_networks),
            assigned: to_refs(&i.assigned_networks),
        })
        .collect()
}

/// (interface, network) pairs that are assigned without being allowed.
///
/// Allowed ⊇ assigned is not enforced by the model; callers use this to
/// check the expectation before deploying.
pub fn assignments_outside_allowed(node: &Node) -> Vec<(InterfaceId, NetworkGroupId)> {
    node.interfaces
        .iter()
        .flat_map(|i| {
            i.assigned_networks
                .iter()
                .filter(|net| !i.is_allowed(**net))
                .map(move |net| (i.id, *net))
        })
        .collect()
}
