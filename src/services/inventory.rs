//! In-memory inventory of clusters, roles, network groups and nodes
//!
//! The inventory is the ownership tree the resolver works on: a node owns
//! its interfaces and an interface owns its allowed/assigned network links.
//! Removing an entity walks the tree top-down and reports what went away.
//! All mutation goes through `&mut self`; callers that share an inventory
//! across workers serialize access per node themselves.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::admin_interface::{self, AdminInterface, SubnetMembership};
use super::discovery::{self, InterfaceSync, MetaUpdate};
use super::roles::{self, RoleAssignment, RoleCatalog};
use crate::config::ResolverConfig;
use crate::models::{
    Cluster, ClusterId, CreateNetworkGroupRequest, InterfaceId, NetworkGroup, NetworkGroupId,
    Node, NodeId, Resolution, Role, RoleTarget,
};
use crate::utils::{validation, AppError, AppResult};

/// Serializable inventory contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventorySnapshot {
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub network_groups: Vec<NetworkGroup>,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl InventorySnapshot {
    /// Load a snapshot from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read inventory file: {:?}", path))?;
        serde_norway::from_str(&contents)
            .with_context(|| format!("Failed to parse inventory file: {:?}", path))
    }
}

/// Rows removed by a cascading delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub nodes: usize,
    pub interfaces: usize,
    pub links: usize,
}

/// Outcome of processing a discovery report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    pub node_id: NodeId,
    /// True when the node was seen for the first time
    pub created: bool,
    pub meta: MetaUpdate,
    pub interfaces: InterfaceSync,
}

/// Clusters, role catalog, network groups and nodes
#[derive(Debug, Clone)]
pub struct Inventory {
    admin_network_name: String,
    clusters: BTreeMap<ClusterId, Cluster>,
    catalog: RoleCatalog,
    network_groups: BTreeMap<NetworkGroupId, NetworkGroup>,
    nodes: BTreeMap<NodeId, Node>,
    next_network_id: NetworkGroupId,
    next_node_id: NodeId,
    next_interface_id: InterfaceId,
}

impl Inventory {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            admin_network_name: config.admin_network_name.clone(),
            clusters: BTreeMap::new(),
            catalog: RoleCatalog::new(),
            network_groups: BTreeMap::new(),
            nodes: BTreeMap::new(),
            next_network_id: 1,
            next_node_id: 1,
            next_interface_id: 1,
        }
    }

    /// Build an inventory from a snapshot, checking every invariant on the way
    pub fn from_snapshot(snapshot: InventorySnapshot, config: &ResolverConfig) -> AppResult<Self> {
        if !validation::validate_network_name(&config.admin_network_name) {
            return Err(AppError::Config(format!(
                "invalid admin network name: {:?}",
                config.admin_network_name
            )));
        }

        let mut inventory = Self::new(config);
        for cluster in snapshot.clusters {
            inventory.add_cluster(cluster)?;
        }
        for role in snapshot.roles {
            inventory.add_role(role)?;
        }
        for group in snapshot.network_groups {
            inventory.add_network_group(group)?;
        }
        for node in snapshot.nodes {
            inventory.add_node(node)?;
        }
        Ok(inventory)
    }

    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            clusters: self.clusters.values().cloned().collect(),
            roles: self.catalog.roles().to_vec(),
            network_groups: self.network_groups.values().cloned().collect(),
            nodes: self.nodes.values().cloned().collect(),
        }
    }

    // Clusters and roles

    pub fn add_cluster(&mut self, cluster: Cluster) -> AppResult<()> {
        if self.clusters.contains_key(&cluster.id) {
            return Err(AppError::Conflict(format!(
                "cluster {} already exists",
                cluster.id
            )));
        }
        self.clusters.insert(cluster.id, cluster);
        Ok(())
    }

    pub fn cluster(&self, id: ClusterId) -> AppResult<&Cluster> {
        self.clusters
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("cluster {}", id)))
    }

    pub fn add_role(&mut self, role: Role) -> AppResult<()> {
        self.catalog.add(role)
    }

    pub fn catalog(&self) -> &RoleCatalog {
        &self.catalog
    }

    // Network groups

    fn add_network_group(&mut self, group: NetworkGroup) -> AppResult<()> {
        if self.network_groups.contains_key(&group.id) {
            return Err(AppError::Conflict(format!(
                "network group {} already exists",
                group.id
            )));
        }
        group.network()?;
        self.next_network_id = self.next_network_id.max(group.id + 1);
        self.network_groups.insert(group.id, group);
        Ok(())
    }

    /// Create a network group from an allow-listed payload
    pub fn create_network_group(
        &mut self,
        request: CreateNetworkGroupRequest,
    ) -> AppResult<&NetworkGroup> {
        request.validate()?;
        if let Some(cluster_id) = request.cluster_id {
            self.cluster(cluster_id)?;
        }

        let id = self.next_network_id;
        let group = request.into_network_group(id);
        group.network()?;

        tracing::debug!(network_id = id, name = %group.name, "Created network group");

        self.next_network_id += 1;
        let group = self.network_groups.entry(id).or_insert(group);
        Ok(&*group)
    }

    pub fn network_group(&self, id: NetworkGroupId) -> AppResult<&NetworkGroup> {
        self.network_groups
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("network group {}", id)))
    }

    pub fn network_groups(&self) -> &BTreeMap<NetworkGroupId, NetworkGroup> {
        &self.network_groups
    }

    pub fn network_groups_for_cluster(&self, cluster_id: ClusterId) -> Vec<&NetworkGroup> {
        self.network_groups
            .values()
            .filter(|g| g.cluster_id == Some(cluster_id))
            .collect()
    }

    /// The cluster-less group carrying administrative traffic
    pub fn admin_network_group(&self) -> AppResult<&NetworkGroup> {
        self.network_groups
            .values()
            .find(|g| g.cluster_id.is_none() && g.name == self.admin_network_name)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "admin network group '{}'",
                    self.admin_network_name
                ))
            })
    }

    /// Delete a network group and every link row pointing at it
    pub fn delete_network_group(&mut self, id: NetworkGroupId) -> AppResult<CascadeReport> {
        self.network_groups
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("network group {}", id)))?;

        let links = self
            .nodes
            .values_mut()
            .flat_map(|n| n.interfaces.iter_mut())
            .map(|i| i.drop_network(id))
            .sum();

        tracing::debug!(network_id = id, links, "Deleted network group");

        Ok(CascadeReport {
            links,
            ..Default::default()
        })
    }

    /// Allow `network_id` on every interface of the listed nodes.
    ///
    /// Existing links are left alone; returns the number of rows created.
    pub fn allow_network(
        &mut self,
        network_id: NetworkGroupId,
        node_ids: &[NodeId],
    ) -> AppResult<usize> {
        self.network_group(network_id)?;
        for node_id in node_ids {
            self.node(*node_id)?;
        }

        let mut created = 0;
        for node_id in node_ids {
            if let Some(node) = self.nodes.get_mut(node_id) {
                for interface in &mut node.interfaces {
                    created += usize::from(interface.allow(network_id));
                }
            }
        }
        Ok(created)
    }

    /// Remove the allowed link to `network_id` from every interface of the
    /// listed nodes. Every link must exist; nothing changes otherwise.
    pub fn disallow_network(
        &mut self,
        network_id: NetworkGroupId,
        node_ids: &[NodeId],
    ) -> AppResult<usize> {
        self.network_group(network_id)?;
        for node_id in node_ids {
            let node = self.node(*node_id)?;
            if let Some(interface) = node.interfaces.iter().find(|i| !i.is_allowed(network_id)) {
                return Err(AppError::NotFound(format!(
                    "network {} is not allowed on interface {} of node {}",
                    network_id, interface.name, node_id
                )));
            }
        }

        let mut removed = 0;
        for node_id in node_ids {
            if let Some(node) = self.nodes.get_mut(node_id) {
                for interface in &mut node.interfaces {
                    removed += usize::from(interface.disallow(network_id));
                }
            }
        }
        Ok(removed)
    }

    /// Bind `network_id` to the named interface of each node
    pub fn assign_network(
        &mut self,
        network_id: NetworkGroupId,
        targets: &BTreeMap<NodeId, String>,
    ) -> AppResult<usize> {
        self.network_group(network_id)?;
        self.check_interfaces_exist(targets)?;

        let mut created = 0;
        for (node_id, nic_name) in targets {
            if let Some(interface) = self
                .nodes
                .get_mut(node_id)
                .and_then(|n| n.interface_mut(nic_name))
            {
                created += usize::from(interface.assign(network_id));
            }
        }
        Ok(created)
    }

    /// Unbind `network_id` from the named interface of each node.
    /// Every binding must exist; nothing changes otherwise.
    pub fn unassign_network(
        &mut self,
        network_id: NetworkGroupId,
        targets: &BTreeMap<NodeId, String>,
    ) -> AppResult<usize> {
        self.network_group(network_id)?;
        self.check_interfaces_exist(targets)?;
        for (node_id, nic_name) in targets {
            let assigned = self
                .node(*node_id)?
                .interface(nic_name)
                .is_some_and(|i| i.is_assigned(network_id));
            if !assigned {
                return Err(AppError::NotFound(format!(
                    "network {} is not assigned to {} of node {}",
                    network_id, nic_name, node_id
                )));
            }
        }

        let mut removed = 0;
        for (node_id, nic_name) in targets {
            if let Some(interface) = self
                .nodes
                .get_mut(node_id)
                .and_then(|n| n.interface_mut(nic_name))
            {
                removed += usize::from(interface.unassign(network_id));
            }
        }
        Ok(removed)
    }

    fn check_interfaces_exist(&self, targets: &BTreeMap<NodeId, String>) -> AppResult<()> {
        for (node_id, nic_name) in targets {
            if !validation::validate_interface_name(nic_name) {
                return Err(AppError::ValidationError(format!(
                    "invalid interface name: {:?}",
                    nic_name
                )));
            }
            if self.node(*node_id)?.interface(nic_name).is_none() {
                return Err(AppError::NotFound(format!(
                    "interface {} of node {}",
                    nic_name, node_id
                )));
            }
        }
        Ok(())
    }

    // Nodes

    /// Add a node, enforcing MAC uniqueness and release compatibility of its roles.
    ///
    /// Interface rows are brought into stored form (lowercase MAC, sorted
    /// link lists); their MACs must be unique per node and every linked
    /// network group must exist.
    pub fn add_node(&mut self, mut node: Node) -> AppResult<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(AppError::Conflict(format!("node {} already exists", node.id)));
        }

        node.mac = validation::normalize_mac(&node.mac);
        if !validation::validate_mac(&node.mac) {
            return Err(AppError::ValidationError(format!(
                "invalid MAC address: {}",
                node.mac
            )));
        }
        if self.node_by_mac(&node.mac).is_some() {
            return Err(AppError::Conflict(format!(
                "a node with MAC {} already exists",
                node.mac
            )));
        }

        let cluster = match node.cluster_id {
            Some(id) => Some(self.cluster(id)?),
            None => None,
        };
        roles::check_release_compatibility(&node, cluster, &self.catalog)?;

        let mut interface_ids = BTreeSet::new();
        let mut interface_macs = BTreeSet::new();
        for interface in &mut node.interfaces {
            interface.normalize();
            if !validation::validate_mac(&interface.mac) {
                return Err(AppError::ValidationError(format!(
                    "invalid MAC address on interface {} of node {}: {}",
                    interface.name, node.id, interface.mac
                )));
            }
            if !interface_ids.insert(interface.id) || self.interface_id_in_use(interface.id) {
                return Err(AppError::Conflict(format!(
                    "interface id {} already exists",
                    interface.id
                )));
            }
            if !interface_macs.insert(interface.mac.clone()) {
                return Err(AppError::Conflict(format!(
                    "node {} has more than one interface with MAC {}",
                    node.id, interface.mac
                )));
            }
            if let Some(unknown) = interface
                .linked_networks()
                .find(|id| !self.network_groups.contains_key(id))
            {
                return Err(AppError::NotFound(format!(
                    "network group {} linked to interface {} of node {}",
                    unknown, interface.name, node.id
                )));
            }
        }

        node.interfaces.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(max_id) = interface_ids.last() {
            self.next_interface_id = self.next_interface_id.max(max_id + 1);
        }
        self.next_node_id = self.next_node_id.max(node.id + 1);
        self.nodes.insert(node.id, node);
        Ok(())
    }

    fn interface_id_in_use(&self, id: InterfaceId) -> bool {
        self.nodes
            .values()
            .flat_map(|n| n.interfaces.iter())
            .any(|i| i.id == id)
    }

    pub fn node(&self, id: NodeId) -> AppResult<&Node> {
        self.nodes
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("node {}", id)))
    }

    /// Mutable access for status transitions and field updates
    pub fn node_mut(&mut self, id: NodeId) -> AppResult<&mut Node> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("node {}", id)))
    }

    pub fn node_by_mac(&self, mac: &str) -> Option<&Node> {
        let mac = validation::normalize_mac(mac);
        self.nodes.values().find(|n| n.mac == mac)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Process a discovery report.
    ///
    /// An unknown MAC creates a node (lenient first-contact validation); a
    /// known one updates it (all-or-nothing validation). Interface rows are
    /// then rebuilt from the stored metadata.
    pub fn discover_node(
        &mut self,
        mac: &str,
        payload: serde_json::Value,
    ) -> AppResult<Resolution<DiscoveryReport>> {
        let mac = validation::normalize_mac(mac);
        if !validation::validate_mac(&mac) {
            return Err(AppError::ValidationError(format!("invalid MAC address: {}", mac)));
        }

        let existing = self.node_by_mac(&mac).map(|n| n.id);
        let created = existing.is_none();
        let node_id = existing.unwrap_or(self.next_node_id);

        let mut node = match existing {
            Some(id) => self.nodes.remove(&id).ok_or_else(|| {
                AppError::Internal(format!("node {} vanished during discovery", id))
            })?,
            None => Node::new(node_id, &mac),
        };

        let meta = match discovery::apply_discovered_interfaces(&mut node, payload, created) {
            Ok(meta) => meta,
            Err(err) => {
                if !created {
                    self.nodes.insert(node_id, node);
                }
                return Err(err);
            }
        };

        let next_interface_id = &mut self.next_interface_id;
        let interfaces = if meta.value.is_applied() {
            discovery::sync_interfaces(&mut node, || {
                let id = *next_interface_id;
                *next_interface_id += 1;
                id
            })
        } else {
            InterfaceSync::default()
        };

        if created {
            self.next_node_id = node_id + 1;
            tracing::debug!(node_id, mac = %mac, "Registered discovered node");
        }
        self.nodes.insert(node_id, node);

        Ok(meta.map(|meta| DiscoveryReport {
            node_id,
            created,
            meta,
            interfaces,
        }))
    }

    /// Move a node into (or out of) a cluster.
    ///
    /// Changing cluster clears both role collections, since roles are
    /// release-scoped.
    pub fn assign_node_to_cluster(
        &mut self,
        node_id: NodeId,
        cluster_id: Option<ClusterId>,
    ) -> AppResult<()> {
        if let Some(id) = cluster_id {
            self.cluster(id)?;
        }
        let node = self.node_mut(node_id)?;
        if node.cluster_id != cluster_id {
            node.roles.clear();
            node.pending_roles.clear();
            node.cluster_id = cluster_id;
        }
        Ok(())
    }

    /// Replace the active or pending roles of a node
    pub fn set_node_roles<I, S>(
        &mut self,
        node_id: NodeId,
        names: I,
        target: RoleTarget,
    ) -> AppResult<Resolution<RoleAssignment>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or_else(|| AppError::NotFound(format!("node {}", node_id)))?;
        let cluster = node.cluster_id.and_then(|id| self.clusters.get(&id));
        roles::set_roles(node, cluster, &self.catalog, names, target)
    }

    /// Resolve the admin interface of a node against the admin network group
    pub fn resolve_admin_interface<S>(
        &self,
        node_id: NodeId,
        subnet: &S,
    ) -> AppResult<Resolution<AdminInterface<'_>>>
    where
        S: SubnetMembership + ?Sized,
    {
        let node = self.node(node_id)?;
        let admin_network = self.admin_network_group()?;
        admin_interface::resolve_admin_interface(node, admin_network, subnet)
    }

    /// Remove one interface and its network links
    pub fn remove_interface(&mut self, node_id: NodeId, name: &str) -> AppResult<CascadeReport> {
        let node = self.node_mut(node_id)?;
        let pos = node
            .interfaces
            .iter()
            .position(|i| i.name == name)
            .ok_or_else(|| AppError::NotFound(format!("interface {} of node {}", name, node_id)))?;
        let interface = node.interfaces.remove(pos);

        Ok(CascadeReport {
            nodes: 0,
            interfaces: 1,
            links: interface.link_count(),
        })
    }

    /// Remove a node, its interfaces and their network links
    pub fn remove_node(&mut self, node_id: NodeId) -> AppResult<CascadeReport> {
        let node = self
            .nodes
            .remove(&node_id)
            .ok_or_else(|| AppError::NotFound(format!("node {}", node_id)))?;

        let report = CascadeReport {
            nodes: 1,
            interfaces: node.interfaces.len(),
            links: node.interfaces.iter().map(|i| i.link_count()).sum(),
        };
        tracing::debug!(node_id, ?report, "Removed node");
        Ok(report)
    }
}
