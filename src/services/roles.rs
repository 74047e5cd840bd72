//! Role assignment and role set queries

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{
    Cluster, Diagnostic, DiagnosticCode, Node, ReleaseId, Resolution, Role, RoleTarget,
};
use crate::utils::{AppError, AppResult};

/// Roles known per release
#[derive(Debug, Clone, Default)]
pub struct RoleCatalog {
    roles: Vec<Role>,
}

impl RoleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, rejecting duplicate ids and duplicate (name, release) pairs
    pub fn from_roles(roles: impl IntoIterator<Item = Role>) -> AppResult<Self> {
        let mut catalog = Self::new();
        for role in roles {
            catalog.add(role)?;
        }
        Ok(catalog)
    }

    pub fn add(&mut self, role: Role) -> AppResult<()> {
        if self.roles.iter().any(|r| r.id == role.id) {
            return Err(AppError::Conflict(format!("role id {} already exists", role.id)));
        }
        if self.find(role.release_id, &role.name).is_some() {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists in release {}",
                role.name, role.release_id
            )));
        }
        self.roles.push(role);
        Ok(())
    }

    pub fn find(&self, release_id: ReleaseId, name: &str) -> Option<&Role> {
        self.roles
            .iter()
            .find(|r| r.release_id == release_id && r.name == name)
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn release_roles(&self, release_id: ReleaseId) -> impl Iterator<Item = &Role> {
        self.roles.iter().filter(move |r| r.release_id == release_id)
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

/// Outcome of a role assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RoleAssignment {
    /// The target collection was replaced
    Applied {
        target: RoleTarget,
        roles: BTreeSet<String>,
        /// Requested names the release does not define
        dropped: BTreeSet<String>,
    },
    /// Node is not in a cluster; nothing changed
    Skipped { target: RoleTarget },
}

impl RoleAssignment {
    pub fn is_applied(&self) -> bool {
        matches!(self, RoleAssignment::Applied { .. })
    }
}

/// Replace the active or pending roles of `node`.
///
/// The target collection becomes exactly the roles of the cluster's release
/// whose names were requested; unknown names are dropped. A node outside any
/// cluster is left untouched and a diagnostic is returned. `cluster` must be
/// the node's own cluster.
pub fn set_roles<I, S>(
    node: &mut Node,
    cluster: Option<&Cluster>,
    catalog: &RoleCatalog,
    names: I,
    target: RoleTarget,
) -> AppResult<Resolution<RoleAssignment>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let Some(cluster_id) = node.cluster_id else {
        return Ok(Resolution::new(RoleAssignment::Skipped { target }).with_diagnostic(
            Diagnostic::warning(
                DiagnosticCode::NodeWithoutCluster,
                node.id,
                format!(
                    "Attempting to assign {} to node '{}' which isn't added to cluster",
                    target.as_str(),
                    node.name.clone().unwrap_or_else(|| node.uid())
                ),
            ),
        ));
    };

    let cluster = match cluster {
        Some(cluster) if cluster.id == cluster_id => cluster,
        Some(other) => {
            return Err(AppError::PreconditionFailed(format!(
                "node {} belongs to cluster {}, not {}",
                node.id, cluster_id, other.id
            )))
        }
        None => {
            return Err(AppError::PreconditionFailed(format!(
                "cluster {} of node {} was not provided",
                cluster_id, node.id
            )))
        }
    };

    let requested: BTreeSet<String> = names
        .into_iter()
        .map(|n| n.as_ref().to_string())
        .collect();

    let roles: Vec<Role> = catalog
        .release_roles(cluster.release_id)
        .filter(|r| requested.contains(&r.name))
        .cloned()
        .collect();

    let applied: BTreeSet<String> = roles.iter().map(|r| r.name.clone()).collect();
    let dropped: BTreeSet<String> = requested.difference(&applied).cloned().collect();

    tracing::debug!(
        node_id = node.id,
        target = target.as_str(),
        roles = ?applied,
        dropped = ?dropped,
        "Replacing node roles"
    );

    match target {
        RoleTarget::Active => node.roles = roles,
        RoleTarget::Pending => node.pending_roles = roles,
    }

    Ok(Resolution::new(RoleAssignment::Applied {
        target,
        roles: applied,
        dropped,
    }))
}

/// Names of the roles currently applied
pub fn active_roles(node: &Node) -> BTreeSet<String> {
    node.roles.iter().map(|r| r.name.clone()).collect()
}

/// Names of the roles queued for the next deployment
pub fn pending_roles(node: &Node) -> BTreeSet<String> {
    node.pending_roles.iter().map(|r| r.name.clone()).collect()
}

/// Union of active and pending role names
pub fn effective_roles(node: &Node) -> BTreeSet<String> {
    node.roles
        .iter()
        .chain(node.pending_roles.iter())
        .map(|r| r.name.clone())
        .collect()
}

/// Check that every role of `node` belongs to its cluster's release
pub fn check_release_compatibility(
    node: &Node,
    cluster: Option<&Cluster>,
    catalog: &RoleCatalog,
) -> AppResult<()> {
    let all_roles = node.roles.iter().chain(node.pending_roles.iter());

    match cluster {
        None => {
            if node.roles.is_empty() && node.pending_roles.is_empty() {
                Ok(())
            } else {
                Err(AppError::Conflict(format!(
                    "node {} carries roles but is not in a cluster",
                    node.id
                )))
            }
        }
        Some(cluster) => {
            for role in all_roles {
                if role.release_id != cluster.release_id || !catalog.contains(role) {
                    return Err(AppError::Conflict(format!(
                        "role '{}' (release {}) is not part of release {} of cluster {}",
                        role.name, role.release_id, cluster.release_id, cluster.id
                    )));
                }
            }
            Ok(())
        }
    }
}
