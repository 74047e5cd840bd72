//! Discovery step definitions

use cucumber::{gherkin::Step, then, when};

use metalnode::services::DiscoveryReport;

use crate::features::support::{list, TestWorld};

#[when(expr = "the node with MAC {string} reports:")]
async fn node_reports(world: &mut TestWorld, mac: String, step: &Step) {
    let payload: serde_json::Value = serde_json::from_str(
        step.docstring.as_deref().expect("step needs a JSON docstring"),
    )
    .expect("Invalid JSON for discovery payload");

    let result = world.inventory.discover_node(&mac, payload);
    if let Some(DiscoveryReport { node_id, .. }) = world.record(result) {
        world.nodes.insert(mac, node_id);
    }
}

#[then(expr = "the node with MAC {string} should have interfaces {string}")]
async fn node_has_interfaces(world: &mut TestWorld, mac: String, names: String) {
    let node = world
        .inventory
        .node_by_mac(&mac)
        .expect("node should be registered");
    let actual: Vec<String> = node.interfaces.iter().map(|i| i.name.clone()).collect();
    assert_eq!(actual, list(&names));
}

#[then(expr = "interface {string} of the node with MAC {string} should report max speed {int}")]
async fn interface_max_speed(world: &mut TestWorld, nic: String, mac: String, speed: u64) {
    let node = world
        .inventory
        .node_by_mac(&mac)
        .expect("node should be registered");
    let interface = node.interface(&nic).expect("interface should exist");
    assert_eq!(interface.max_speed, Some(speed));
}

#[then(expr = "interface {string} of the node with MAC {string} should have no max speed")]
async fn interface_no_max_speed(world: &mut TestWorld, nic: String, mac: String) {
    let node = world
        .inventory
        .node_by_mac(&mac)
        .expect("node should be registered");
    let interface = node.interface(&nic).expect("interface should exist");
    assert_eq!(interface.max_speed, None);
}
