//! Interface data model

use serde::{Deserialize, Serialize};

use super::NetworkGroupId;
use crate::utils::validation;

/// Interface identifier
pub type InterfaceId = u64;

/// A physical NIC of a node.
///
/// The interface owns its allowed/assigned network link rows; both lists are
/// kept sorted by network group id without duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInterface {
    pub id: InterfaceId,
    pub name: String,
    /// Lowercase MAC
    pub mac: String,
    #[serde(default)]
    pub max_speed: Option<u64>,
    #[serde(default)]
    pub current_speed: Option<u64>,
    #[serde(default)]
    pub ip_addr: Option<String>,
    #[serde(default)]
    pub netmask: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Networks this interface is permitted to carry
    #[serde(default)]
    pub allowed_networks: Vec<NetworkGroupId>,
    /// Networks actually bound to this interface
    #[serde(default)]
    pub assigned_networks: Vec<NetworkGroupId>,
}

impl NodeInterface {
    pub fn new(id: InterfaceId, name: &str, mac: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            mac: validation::normalize_mac(mac),
            max_speed: None,
            current_speed: None,
            ip_addr: None,
            netmask: None,
            state: None,
            allowed_networks: vec![],
            assigned_networks: vec![],
        }
    }

    pub fn is_allowed(&self, network_id: NetworkGroupId) -> bool {
        self.allowed_networks.binary_search(&network_id).is_ok()
    }

    pub fn is_assigned(&self, network_id: NetworkGroupId) -> bool {
        self.assigned_networks.binary_search(&network_id).is_ok()
    }

    /// Returns false if the link already existed
    pub fn allow(&mut self, network_id: NetworkGroupId) -> bool {
        insert_link(&mut self.allowed_networks, network_id)
    }

    /// Returns false if there was no such link
    pub fn disallow(&mut self, network_id: NetworkGroupId) -> bool {
        remove_link(&mut self.allowed_networks, network_id)
    }

    /// Returns false if the link already existed
    pub fn assign(&mut self, network_id: NetworkGroupId) -> bool {
        insert_link(&mut self.assigned_networks, network_id)
    }

    /// Returns false if there was no such link
    pub fn unassign(&mut self, network_id: NetworkGroupId) -> bool {
        remove_link(&mut self.assigned_networks, network_id)
    }

    /// Drop every link to `network_id`, returning how many rows went away
    pub fn drop_network(&mut self, network_id: NetworkGroupId) -> usize {
        usize::from(self.disallow(network_id)) + usize::from(self.unassign(network_id))
    }

    /// Restore the sorted, duplicate-free form of both link lists and the
    /// lowercase MAC, for rows that did not go through the link setters
    pub fn normalize(&mut self) {
        self.mac = validation::normalize_mac(&self.mac);
        for links in [&mut self.allowed_networks, &mut self.assigned_networks] {
            links.sort_unstable();
            links.dedup();
        }
    }

    /// Every network id linked to this interface, allowed first
    pub fn linked_networks(&self) -> impl Iterator<Item = NetworkGroupId> + '_ {
        self.allowed_networks
            .iter()
            .chain(self.assigned_networks.iter())
            .copied()
    }

    /// Number of link rows owned by this interface
    pub fn link_count(&self) -> usize {
        self.allowed_networks.len() + self.assigned_networks.len()
    }

    /// Refresh the hardware-reported fields from a discovery descriptor
    pub fn refresh_from(&mut self, descriptor: &InterfaceDescriptor) {
        self.name = descriptor.name.clone();
        self.mac = validation::normalize_mac(&descriptor.mac);
        self.max_speed = descriptor.max_speed;
        self.current_speed = descriptor.current_speed;
        self.ip_addr = descriptor.extra_str("ip");
        self.netmask = descriptor.extra_str("netmask");
        self.state = descriptor.extra_str("state");
    }
}

fn insert_link(links: &mut Vec<NetworkGroupId>, network_id: NetworkGroupId) -> bool {
    match links.binary_search(&network_id) {
        Ok(_) => false,
        Err(pos) => {
            links.insert(pos, network_id);
            true
        }
    }
}

fn remove_link(links: &mut Vec<NetworkGroupId>, network_id: NetworkGroupId) -> bool {
    match links.binary_search(&network_id) {
        Ok(pos) => {
            links.remove(pos);
            true
        }
        Err(_) => false,
    }
}

/// Discovery metadata reported by the node agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMeta {
    /// Validated interface descriptors
    #[serde(default)]
    pub interfaces: Vec<InterfaceDescriptor>,

    /// Everything else the agent reported (cpu, memory, disks, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A validated interface descriptor from discovery metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDescriptor {
    pub name: String,
    pub mac: String,
    /// `None` when the agent reported nothing usable
    pub max_speed: Option<u64>,
    pub current_speed: Option<u64>,
    /// Remaining reported fields (ip, netmask, state, driver, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl InterfaceDescriptor {
    pub fn new(name: &str, mac: &str) -> Self {
        Self {
            name: name.to_string(),
            mac: mac.to_string(),
            max_speed: None,
            current_speed: None,
            extra: serde_json::Map::new(),
        }
    }

    fn extra_str(&self, key: &str) -> Option<String> {
        self.extra
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}
