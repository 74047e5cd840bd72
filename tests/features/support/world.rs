//! Test world for Cucumber scenarios

use std::collections::HashMap;

use cucumber::World;

use metalnode::config::ResolverConfig;
use metalnode::models::{Diagnostic, DiagnosticCode, NodeId, NodeInterface};
use metalnode::services::AdminMatch;
use metalnode::{AppError, Inventory};

/// Test world that maintains state across scenario steps
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct TestWorld {
    /// Inventory under test
    pub inventory: Inventory,

    /// Node ids by scenario name
    pub nodes: HashMap<String, NodeId>,

    /// Cluster ids by scenario name
    pub clusters: HashMap<String, u64>,

    /// Admin interface picked by the last resolution (name, rule)
    pub admin: Option<(String, AdminMatch)>,

    /// Diagnostics produced by the last operation
    pub diagnostics: Vec<Diagnostic>,

    /// Error returned by the last operation
    pub last_error: Option<AppError>,

    next_node: u64,
}

impl TestWorld {
    /// Create a new test world with an empty inventory
    pub fn new() -> Self {
        Self {
            inventory: Inventory::new(&ResolverConfig::default()),
            nodes: HashMap::new(),
            clusters: HashMap::new(),
            admin: None,
            diagnostics: vec![],
            last_error: None,
            next_node: 0,
        }
    }

    pub fn node_id(&self, name: &str) -> NodeId {
        *self
            .nodes
            .get(name)
            .unwrap_or_else(|| panic!("node {:?} was never created", name))
    }

    pub fn cluster_id(&self, name: &str) -> u64 {
        *self
            .clusters
            .get(name)
            .unwrap_or_else(|| panic!("cluster {:?} was never created", name))
    }

    /// MAC of the `nic`-th interface of the `seq`-th node
    pub fn mac(seq: u64, nic: u64) -> String {
        format!("52:54:00:00:{:02x}:{:02x}", seq & 0xff, nic & 0xff)
    }

    /// Add a node whose interfaces are named by `interfaces`.
    ///
    /// With `own_mac` the first interface carries the node's MAC; otherwise
    /// no interface does.
    pub fn add_node(&mut self, name: &str, interfaces: &[String], own_mac: bool) {
        self.next_node += 1;
        let seq = self.next_node;

        let mut node = metalnode::models::Node::new(seq, &Self::mac(seq, 0));
        node.name = Some(name.to_string());
        for (i, nic) in interfaces.iter().enumerate() {
            let index = i as u64 + if own_mac { 0 } else { 0x80 };
            node.insert_interface(NodeInterface::new(
                seq * 100 + i as u64,
                nic,
                &Self::mac(seq, index),
            ));
        }

        self.inventory.add_node(node).expect("node should be accepted");
        self.nodes.insert(name.to_string(), seq);
    }

    /// Record the outcome of an operation that produces diagnostics
    pub fn record<T>(
        &mut self,
        result: metalnode::AppResult<metalnode::models::Resolution<T>>,
    ) -> Option<T> {
        self.diagnostics.clear();
        self.last_error = None;
        match result {
            Ok(resolution) => {
                let (value, diagnostics) = resolution.into_parts();
                self.diagnostics = diagnostics;
                Some(value)
            }
            Err(e) => {
                self.last_error = Some(e);
                None
            }
        }
    }

    pub fn has_diagnostic(&self, code: DiagnosticCode) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }
}

/// Split a comma separated step argument
pub fn list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a snake_case enum name through its serde representation
pub fn parse_snake<T: serde::de::DeserializeOwned>(raw: &str) -> T {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .unwrap_or_else(|_| panic!("unknown value {:?}", raw))
}
