//! Network group data model

use std::net::IpAddr;

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ClusterId, ReleaseId};
use crate::utils::AppResult;

pub type NetworkGroupId = u64;

/// A named IP block, optionally scoped to a cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkGroup {
    pub id: NetworkGroupId,
    pub name: String,
    #[serde(default)]
    pub release: Option<ReleaseId>,
    /// `None` for groups shared by every cluster (e.g. the admin network)
    #[serde(default)]
    pub cluster_id: Option<ClusterId>,
    #[serde(default)]
    pub network_size: Option<u32>,
    #[serde(default)]
    pub amount: Option<u32>,
    #[serde(default)]
    pub vlan_start: Option<u16>,
    #[serde(default)]
    pub cidr: Option<String>,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub netmask: Option<String>,
    #[serde(default)]
    pub ip_range: Option<IpRange>,
}

impl NetworkGroup {
    pub fn new(id: NetworkGroupId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            release: None,
            cluster_id: None,
            network_size: None,
            amount: None,
            vlan_start: None,
            cidr: None,
            gateway: None,
            netmask: None,
            ip_range: None,
        }
    }

    pub fn with_cidr(mut self, cidr: &str) -> Self {
        self.cidr = Some(cidr.to_string());
        self
    }

    /// Parsed CIDR, if one is set
    pub fn network(&self) -> AppResult<Option<IpNetwork>> {
        match &self.cidr {
            Some(cidr) => Ok(Some(cidr.parse::<IpNetwork>()?)),
            None => Ok(None),
        }
    }

    /// Whether `ip` lies inside this group's CIDR.
    ///
    /// Unparseable addresses and groups without a valid CIDR never match.
    pub fn contains_ip(&self, ip: &str) -> bool {
        let Ok(addr) = ip.parse::<IpAddr>() else {
            return false;
        };
        match self.network() {
            Ok(Some(network)) => network.contains(addr),
            _ => false,
        }
    }
}

/// Explicit address range inside a network group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRange {
    pub first: String,
    pub last: String,
}

/// Allow-listed payload for creating a network group.
///
/// `id` is accepted but ignored; any other unknown key is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateNetworkGroupRequest {
    #[serde(default)]
    pub id: Option<NetworkGroupId>,
    #[validate(custom(function = "crate::utils::validation::network_name"))]
    pub name: String,
    #[serde(default)]
    pub release: Option<ReleaseId>,
    #[serde(default)]
    pub cluster_id: Option<ClusterId>,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub network_size: Option<u32>,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub amount: Option<u32>,
    #[serde(default)]
    #[validate(range(min = 1, max = 4094))]
    pub vlan_start: Option<u16>,
    #[serde(default)]
    pub cidr: Option<String>,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub netmask: Option<String>,
    #[serde(default)]
    pub ip_start: Option<String>,
    #[serde(default)]
    pub ip_end: Option<String>,
}

impl CreateNetworkGroupRequest {
    /// Build the group, attaching an IP range only when both ends are given
    pub fn into_network_group(self, id: NetworkGroupId) -> NetworkGroup {
        let ip_range = match (self.ip_start, self.ip_end) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                Some(IpRange { first, last })
            }
            _ => None,
        };

        NetworkGroup {
            id,
            name: self.name,
            release: self.release,
            cluster_id: self.cluster_id,
            network_size: self.network_size,
            amount: self.amount,
            vlan_start: self.vlan_start,
            cidr: self.cidr,
            gateway: self.gateway,
            netmask: self.netmask,
            ip_range,
        }
    }
}
