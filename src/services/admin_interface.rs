//! Admin interface resolution
//!
//! Picks the interface a node uses for the administrative network. Rules are
//! tried in order and the first hit wins:
//!
//! 1. an interface whose allowed networks contain the admin network
//! 2. the first interface whose IP lies inside the admin subnet
//! 3. the interface carrying the node's own (discovery) MAC
//! 4. the first interface, reported with a warning diagnostic

use serde::Serialize;

use crate::models::{Diagnostic, DiagnosticCode, NetworkGroup, Node, NodeInterface, Resolution};
use crate::utils::{AppError, AppResult};

/// IP-in-subnet test used by the second resolution rule
pub trait SubnetMembership {
    fn contains(&self, network: &NetworkGroup, ip: &str) -> bool;
}

/// Membership test against the group's CIDR
#[derive(Debug, Clone, Copy, Default)]
pub struct CidrMembership;

impl SubnetMembership for CidrMembership {
    fn contains(&self, network: &NetworkGroup, ip: &str) -> bool {
        network.contains_ip(ip)
    }
}

/// Which rule identified the admin interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminMatch {
    AllowedNetwork,
    AdminSubnet,
    NodeMac,
    FirstInterface,
}

/// The resolved admin interface, borrowed from the node
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AdminInterface<'a> {
    pub interface: &'a NodeInterface,
    pub matched_by: AdminMatch,
}

/// Resolve the admin interface of `node`.
///
/// Fails only when the node has no interfaces at all.
pub fn resolve_admin_interface<'a, S>(
    node: &'a Node,
    admin_network: &NetworkGroup,
    subnet: &S,
) -> AppResult<Resolution<AdminInterface<'a>>>
where
    S: SubnetMembership + ?Sized,
{
    let Some(first) = node.interfaces.first() else {
        return Err(AppError::PreconditionFailed(format!(
            "node {} has no interfaces",
            node.full_name()
        )));
    };

    let found = |interface: &'a NodeInterface,
                 matched_by: AdminMatch|
     -> AppResult<Resolution<AdminInterface<'a>>> {
        tracing::debug!(
            node_id = node.id,
            interface = %interface.name,
            matched_by = ?matched_by,
            "Resolved admin interface"
        );
        Ok(Resolution::new(AdminInterface {
            interface,
            matched_by,
        }))
    };

    if let Some(interface) = node
        .interfaces
        .iter()
        .find(|i| i.is_allowed(admin_network.id))
    {
        return found(interface, AdminMatch::AllowedNetwork);
    }

    if let Some(interface) = node.interfaces.iter().find(|i| {
        i.ip_addr
            .as_deref()
            .is_some_and(|ip| subnet.contains(admin_network, ip))
    }) {
        return found(interface, AdminMatch::AdminSubnet);
    }

    if let Some(interface) = node
        .interfaces
        .iter()
        .find(|i| i.mac.eq_ignore_ascii_case(&node.mac))
    {
        return found(interface, AdminMatch::NodeMac);
    }

    Ok(Resolution::new(AdminInterface {
        interface: first,
        matched_by: AdminMatch::FirstInterface,
    })
    .with_diagnostic(Diagnostic::warning(
        DiagnosticCode::AdminInterfaceFallback,
        node.id,
        format!(
            "Cannot find admin interface for node {}, using first interface \"{}\"",
            node.full_name(),
            first.name
        ),
    )))
}
