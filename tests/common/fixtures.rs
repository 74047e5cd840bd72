//! Test fixtures for common test data
//!
//! Fixtures provide pre-defined test data that can be used across multiple tests.

use serde_json::{json, Value};

use metalnode::config::ResolverConfig;
use metalnode::models::{Cluster, CreateNetworkGroupRequest, Role};
use metalnode::Inventory;

/// Fixed ids for testing (reproducible tests)
pub mod ids {
    pub const RELEASE_A: u64 = 1;
    pub const RELEASE_B: u64 = 2;
    pub const CLUSTER_A: u64 = 10;
    pub const CLUSTER_B: u64 = 20;
    pub const ADMIN_NETWORK: u64 = 1;
    pub const PUBLIC_NETWORK: u64 = 2;
}

pub const ADMIN_CIDR: &str = "10.20.0.0/24";

/// Clusters built against two different releases
pub struct ClusterFixtures;

impl ClusterFixtures {
    pub fn cluster_a() -> Cluster {
        Cluster {
            id: ids::CLUSTER_A,
            name: "env-a".to_string(),
            release_id: ids::RELEASE_A,
        }
    }

    pub fn cluster_b() -> Cluster {
        Cluster {
            id: ids::CLUSTER_B,
            name: "env-b".to_string(),
            release_id: ids::RELEASE_B,
        }
    }
}

/// Role catalog shared by both releases.
///
/// "compute" exists in both releases, "controller" only in A and
/// "ceph-osd" only in B.
pub struct RoleFixtures;

impl RoleFixtures {
    pub fn all() -> Vec<Role> {
        vec![
            Role {
                id: 1,
                release_id: ids::RELEASE_A,
                name: "controller".to_string(),
            },
            Role {
                id: 2,
                release_id: ids::RELEASE_A,
                name: "compute".to_string(),
            },
            Role {
                id: 3,
                release_id: ids::RELEASE_A,
                name: "cinder".to_string(),
            },
            Role {
                id: 4,
                release_id: ids::RELEASE_B,
                name: "compute".to_string(),
            },
            Role {
                id: 5,
                release_id: ids::RELEASE_B,
                name: "ceph-osd".to_string(),
            },
        ]
    }
}

/// Inventory fixtures
pub struct InventoryFixtures;

impl InventoryFixtures {
    /// Two clusters, the role catalog, the admin network (id 1) and a
    /// public network of cluster A (id 2). No nodes.
    pub fn standard() -> Inventory {
        let mut inventory = Inventory::new(&ResolverConfig::default());
        inventory.add_cluster(ClusterFixtures::cluster_a()).unwrap();
        inventory.add_cluster(ClusterFixtures::cluster_b()).unwrap();
        for role in RoleFixtures::all() {
            inventory.add_role(role).unwrap();
        }

        let admin = inventory
            .create_network_group(CreateNetworkGroupRequest {
                name: "admin".to_string(),
                cidr: Some(ADMIN_CIDR.to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(admin.id, ids::ADMIN_NETWORK);

        let public = inventory
            .create_network_group(CreateNetworkGroupRequest {
                name: "public".to_string(),
                cluster_id: Some(ids::CLUSTER_A),
                cidr: Some("172.16.0.0/24".to_string()),
                vlan_start: Some(100),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(public.id, ids::PUBLIC_NETWORK);

        inventory
    }
}

/// Discovery payload fixtures
pub struct PayloadFixtures;

impl PayloadFixtures {
    /// A well-formed report with two NICs; eth0 sits in the admin subnet
    pub fn two_nics(mac: &str, second_mac: &str) -> Value {
        json!({
            "interfaces": [
                {"name": "eth0", "mac": mac, "ip": "10.20.0.15", "max_speed": 1000, "current_speed": 1000},
                {"name": "eth1", "mac": second_mac, "max_speed": 10000, "current_speed": null}
            ],
            "cpu": {"total": 8},
            "memory": {"total": 17179869184u64}
        })
    }

    /// A report whose second descriptor has no MAC
    pub fn one_broken(mac: &str) -> Value {
        json!({
            "interfaces": [
                {"name": "eth0", "mac": mac},
                {"name": "eth1"}
            ],
            "cpu": {"total": 16}
        })
    }
}

/// YAML inventory snapshots as an operator would write them
pub struct SnapshotFixtures;

impl SnapshotFixtures {
    /// One cluster, the admin (1), public (2) and storage (3) networks, and
    /// node 1 (MAC `AA:BB:CC:DD:EE:00`) carrying the given interface list
    pub fn with_interfaces(interfaces: &str) -> String {
        format!(
            r#"clusters:
  - id: 10
    name: env-a
    release_id: 1
roles:
  - id: 1
    release_id: 1
    name: controller
network_groups:
  - id: 1
    name: admin
    cidr: 10.20.0.0/24
  - id: 2
    name: public
    cluster_id: 10
  - id: 3
    name: storage
    cluster_id: 10
nodes:
  - id: 1
    mac: "AA:BB:CC:DD:EE:00"
    cluster_id: 10
    interfaces:
{}"#,
            interfaces
        )
    }

    /// Uppercase MACs, links out of order and repeated
    pub fn unsorted_links() -> String {
        Self::with_interfaces(
            r#"      - id: 10
        name: eth0
        mac: "AA:BB:CC:DD:EE:00"
      - id: 11
        name: eth1
        mac: "AA:BB:CC:DD:EE:01"
        allowed_networks: [3, 2, 1, 2]
        assigned_networks: [2, 2]
"#,
        )
    }

    /// eth1 links a network group that does not exist
    pub fn unknown_network() -> String {
        Self::with_interfaces(
            r#"      - id: 10
        name: eth0
        mac: "AA:BB:CC:DD:EE:00"
      - id: 11
        name: eth1
        mac: "AA:BB:CC:DD:EE:01"
        allowed_networks: [1, 9]
"#,
        )
    }

    /// A VLAN row sharing the MAC of its parent
    pub fn duplicate_mac() -> String {
        Self::with_interfaces(
            r#"      - id: 10
        name: eth0
        mac: "AA:BB:CC:DD:EE:00"
      - id: 11
        name: eth0.100
        mac: "aa:bb:cc:dd:ee:00"
        assigned_networks: [2]
"#,
        )
    }

    /// An interface MAC that is not a MAC at all
    pub fn invalid_mac() -> String {
        Self::with_interfaces(
            r#"      - id: 10
        name: eth0
        mac: "not-a-mac"
"#,
        )
    }
}
