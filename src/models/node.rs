//! Node data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ClusterId, NodeInterface, NodeMeta, Role};
use crate::utils::{validation, AppError, AppResult};

/// Node identifier
pub type NodeId = u64;

/// A bare-metal machine known to the deployment manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,

    /// Cluster the node has been added to
    #[serde(default)]
    pub cluster_id: Option<ClusterId>,

    /// Operator-facing name
    #[serde(default)]
    pub name: Option<String>,

    /// Lifecycle status
    #[serde(default)]
    pub status: NodeStatus,

    /// Kind of failure when `status` is `error`
    #[serde(default)]
    pub error_type: Option<NodeErrorType>,

    /// Failure description
    #[serde(default)]
    pub error_msg: Option<String>,

    /// Raw discovery payload
    #[serde(default)]
    pub meta: NodeMeta,

    /// MAC of the interface the node was discovered on (lowercase)
    pub mac: String,

    #[serde(default)]
    pub ip: Option<String>,

    #[serde(default)]
    pub fqdn: Option<String>,

    #[serde(default)]
    pub manufacturer: Option<String>,

    #[serde(default)]
    pub platform_name: Option<String>,

    #[serde(default)]
    pub os_platform: Option<String>,

    /// Progress of the running provisioning/deployment task, 0..=100
    #[serde(default)]
    pub progress: u8,

    #[serde(default)]
    pub pending_addition: bool,

    #[serde(default)]
    pub pending_deletion: bool,

    /// Whether the discovery agent still reports in
    #[serde(default = "default_online")]
    pub online: bool,

    #[serde(default)]
    pub rack_id: Option<u64>,

    /// Time of first discovery
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Roles currently applied
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Roles queued for the next deployment run
    #[serde(default)]
    pub pending_roles: Vec<Role>,

    /// Physical interfaces, ordered by name
    #[serde(default)]
    pub interfaces: Vec<NodeInterface>,
}

fn default_online() -> bool {
    true
}

impl Node {
    /// Create a freshly discovered node
    pub fn new(id: NodeId, mac: &str) -> Self {
        Self {
            id,
            cluster_id: None,
            name: None,
            status: NodeStatus::Discover,
            error_type: None,
            error_msg: None,
            meta: NodeMeta::default(),
            mac: validation::normalize_mac(mac),
            ip: None,
            fqdn: None,
            manufacturer: None,
            platform_name: None,
            os_platform: None,
            progress: 0,
            pending_addition: false,
            pending_deletion: false,
            online: true,
            rack_id: None,
            timestamp: Utc::now(),
            roles: vec![],
            pending_roles: vec![],
            interfaces: vec![],
        }
    }

    pub fn uid(&self) -> String {
        self.id.to_string()
    }

    pub fn offline(&self) -> bool {
        !self.online
    }

    /// Name if set, MAC otherwise
    pub fn human_readable_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.mac)
    }

    pub fn full_name(&self) -> String {
        format!(
            "{} (id={}, mac={})",
            self.name.as_deref().unwrap_or("unnamed"),
            self.id,
            self.mac
        )
    }

    /// Status is `error` after a failed provisioning that is not being deleted
    pub fn needs_reprovision(&self) -> bool {
        self.status == NodeStatus::Error
            && self.error_type == Some(NodeErrorType::Provision)
            && !self.pending_deletion
    }

    /// Errored or carrying pending roles, and not being deleted
    pub fn needs_redeploy(&self) -> bool {
        (self.status == NodeStatus::Error || !self.pending_roles.is_empty())
            && !self.pending_deletion
    }

    /// Status is `error` after a failed deletion
    pub fn needs_redeletion(&self) -> bool {
        self.status == NodeStatus::Error && self.error_type == Some(NodeErrorType::Deletion)
    }

    /// Interface by name
    pub fn interface(&self, name: &str) -> Option<&NodeInterface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    pub fn interface_mut(&mut self, name: &str) -> Option<&mut NodeInterface> {
        self.interfaces.iter_mut().find(|i| i.name == name)
    }

    /// Insert an interface keeping the list ordered by name
    pub fn insert_interface(&mut self, interface: NodeInterface) {
        let pos = self
            .interfaces
            .partition_point(|i| i.name.as_str() <= interface.name.as_str());
        self.interfaces.insert(pos, interface);
    }

    /// Move to `next` along the node lifecycle.
    ///
    /// Leaving `error` clears the recorded failure.
    pub fn transition(&mut self, next: NodeStatus) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "node {} cannot move from {} to {}",
                self.id,
                self.status.as_str(),
                next.as_str()
            )));
        }

        tracing::debug!(
            node_id = self.id,
            from = self.status.as_str(),
            to = next.as_str(),
            "Node status transition"
        );

        if self.status == NodeStatus::Error {
            self.error_type = None;
            self.error_msg = None;
        }
        self.status = next;
        Ok(())
    }

    /// Move to `error`, tagged with the failed operation
    pub fn fail(&mut self, kind: NodeErrorType, message: impl Into<String>) -> AppResult<()> {
        if !kind.reachable_from(self.status) {
            return Err(AppError::Conflict(format!(
                "node {} cannot fail with {} error while {}",
                self.id,
                kind.as_str(),
                self.status.as_str()
            )));
        }

        self.status = NodeStatus::Error;
        self.error_type = Some(kind);
        self.error_msg = Some(message.into());
        Ok(())
    }

    /// Apply an allow-listed field update
    pub fn apply_update(&mut self, update: NodeUpdate) -> AppResult<()> {
        update.validate()?;

        if let Some(name) = update.name {
            self.name = Some(name);
        }
        if let Some(ip) = update.ip {
            self.ip = Some(ip);
        }
        if let Some(fqdn) = update.fqdn {
            self.fqdn = Some(fqdn);
        }
        if let Some(manufacturer) = update.manufacturer {
            self.manufacturer = Some(manufacturer);
        }
        if let Some(platform_name) = update.platform_name {
            self.platform_name = Some(platform_name);
        }
        if let Some(os_platform) = update.os_platform {
            self.os_platform = Some(os_platform);
        }
        if let Some(progress) = update.progress {
            self.progress = progress;
        }
        if let Some(online) = update.online {
            self.online = online;
        }
        if let Some(pending_addition) = update.pending_addition {
            self.pending_addition = pending_addition;
        }
        if let Some(pending_deletion) = update.pending_deletion {
            self.pending_deletion = pending_deletion;
        }
        if let Some(rack_id) = update.rack_id {
            self.rack_id = Some(rack_id);
        }
        Ok(())
    }
}

/// Node lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Ready,
    #[default]
    Discover,
    Provisioning,
    Provisioned,
    Deploying,
    Error,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Ready => "ready",
            NodeStatus::Discover => "discover",
            NodeStatus::Provisioning => "provisioning",
            NodeStatus::Provisioned => "provisioned",
            NodeStatus::Deploying => "deploying",
            NodeStatus::Error => "error",
        }
    }

    /// Non-failure lifecycle edges. Any status may fall back to `discover`.
    pub fn can_transition_to(self, next: NodeStatus) -> bool {
        use NodeStatus::*;
        matches!(
            (self, next),
            (Discover, Provisioning)
                | (Provisioning, Provisioned)
                | (Provisioned, Deploying)
                | (Deploying, Ready)
                | (Ready, Deploying)
                | (Ready, Provisioning)
                | (Error, Provisioning)
                | (Error, Deploying)
                | (_, Discover)
        )
    }
}

impl std::str::FromStr for NodeStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ready" => Ok(NodeStatus::Ready),
            "discover" => Ok(NodeStatus::Discover),
            "provisioning" => Ok(NodeStatus::Provisioning),
            "provisioned" => Ok(NodeStatus::Provisioned),
            "deploying" => Ok(NodeStatus::Deploying),
            "error" => Ok(NodeStatus::Error),
            other => Err(AppError::BadRequest(format!("unknown node status: {}", other))),
        }
    }
}

/// Operation a node failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeErrorType {
    Deploy,
    Provision,
    Deletion,
    Discover,
}

impl NodeErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeErrorType::Deploy => "deploy",
            NodeErrorType::Provision => "provision",
            NodeErrorType::Deletion => "deletion",
            NodeErrorType::Discover => "discover",
        }
    }

    /// Statuses from which a failure of this kind can be recorded
    pub fn reachable_from(self, status: NodeStatus) -> bool {
        match self {
            NodeErrorType::Provision => status == NodeStatus::Provisioning,
            NodeErrorType::Deploy => status == NodeStatus::Deploying,
            NodeErrorType::Discover => status == NodeStatus::Discover,
            NodeErrorType::Deletion => true,
        }
    }
}

/// Allow-listed node update. Unknown keys are rejected on deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NodeUpdate {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 15))]
    pub ip: Option<String>,
    #[validate(length(max = 255))]
    pub fqdn: Option<String>,
    #[validate(length(max = 50))]
    pub manufacturer: Option<String>,
    #[validate(length(max = 150))]
    pub platform_name: Option<String>,
    #[validate(length(max = 150))]
    pub os_platform: Option<String>,
    #[validate(range(max = 100))]
    pub progress: Option<u8>,
    pub online: Option<bool>,
    pub pending_addition: Option<bool>,
    pub pending_deletion: Option<bool>,
    pub rack_id: Option<u64>,
}

impl NodeUpdate {
    /// Parse an update from a raw payload
    pub fn from_value(value: serde_json::Value) -> AppResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}
