//! Role and cluster data model

use serde::{Deserialize, Serialize};

pub type RoleId = u64;
pub type ReleaseId = u64;
pub type ClusterId = u64;

/// A deployable role, scoped to a release. (name, release_id) is unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub release_id: ReleaseId,
    pub name: String,
}

/// A cluster built against one release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub name: String,
    pub release_id: ReleaseId,
}

/// Which role collection of a node an assignment replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleTarget {
    /// Roles currently applied
    Active,
    /// Roles queued for the next deployment run
    Pending,
}

impl RoleTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleTarget::Active => "roles",
            RoleTarget::Pending => "pending_roles",
        }
    }
}
