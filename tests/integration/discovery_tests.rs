//! Discovery reports folded into the inventory

use rstest::{fixture, rstest};
use serde_json::{json, Value};

use metalnode::models::DiagnosticCode;
use metalnode::services::{AdminMatch, CidrMembership, MetaUpdate};
use metalnode::{AppError, Inventory};

use crate::common::{ids, InventoryFixtures, PayloadFixtures};

const MAC: &str = "52:54:00:aa:00:00";
const SECOND_MAC: &str = "52:54:00:aa:00:01";

#[fixture]
fn inventory() -> Inventory {
    InventoryFixtures::standard()
}

#[rstest]
fn test_first_contact_registers_node(mut inventory: Inventory) {
    let report = inventory
        .discover_node(&MAC.to_uppercase(), PayloadFixtures::two_nics(MAC, SECOND_MAC))
        .unwrap();
    assert!(report.is_clean());
    assert!(report.value.created);
    assert_eq!(report.value.meta, MetaUpdate::Applied { stored: 2, dropped: 0 });
    assert_eq!(report.value.interfaces.added, vec!["eth0", "eth1"]);

    let node = inventory.node(report.value.node_id).unwrap();
    assert_eq!(node.mac, MAC);
    assert_eq!(node.interfaces.len(), 2);
    assert_eq!(node.interfaces[0].max_speed, Some(1000));
    assert_eq!(node.interfaces[1].current_speed, None);
    assert_eq!(node.meta.extra["cpu"]["total"], 8);

    let admin = inventory
        .resolve_admin_interface(node.id, &CidrMembership)
        .unwrap();
    assert_eq!(admin.value.matched_by, AdminMatch::AdminSubnet);
    assert_eq!(admin.value.interface.name, "eth0");
}

#[rstest]
fn test_first_contact_drops_invalid_descriptors(mut inventory: Inventory) {
    let report = inventory
        .discover_node(MAC, PayloadFixtures::one_broken(MAC))
        .unwrap();

    assert_eq!(report.value.meta, MetaUpdate::Applied { stored: 1, dropped: 1 });
    assert!(report.has(DiagnosticCode::InterfaceSkipped));
    assert_eq!(inventory.node(report.value.node_id).unwrap().interfaces.len(), 1);
}

#[rstest]
fn test_update_with_invalid_descriptor_keeps_interfaces(mut inventory: Inventory) {
    let first = inventory
        .discover_node(MAC, PayloadFixtures::two_nics(MAC, SECOND_MAC))
        .unwrap();
    let node_id = first.value.node_id;

    let second = inventory
        .discover_node(MAC, PayloadFixtures::one_broken(MAC))
        .unwrap();
    assert!(!second.value.created);
    assert_eq!(second.value.meta, MetaUpdate::Rejected { retained: 2 });
    assert!(second.has(DiagnosticCode::InterfaceUpdateRejected));

    let node = inventory.node(node_id).unwrap();
    assert_eq!(node.meta.interfaces.len(), 2);
    assert_eq!(node.interfaces.len(), 2);
    // the rest of the payload still replaces the stored metadata
    assert_eq!(node.meta.extra["cpu"]["total"], 16);
    assert!(!node.meta.extra.contains_key("memory"));
}

#[rstest]
fn test_rediscovery_keeps_ids_and_links(mut inventory: Inventory) {
    let first = inventory
        .discover_node(MAC, PayloadFixtures::two_nics(MAC, SECOND_MAC))
        .unwrap();
    let node_id = first.value.node_id;
    inventory.allow_network(ids::ADMIN_NETWORK, &[node_id]).unwrap();
    let eth1_id = inventory.node(node_id).unwrap().interface("eth1").unwrap().id;

    let renamed = json!({"interfaces": [
        {"name": "eno1", "mac": MAC},
        {"name": "eno2", "mac": SECOND_MAC.to_uppercase()}
    ]});
    let report = inventory.discover_node(MAC, renamed).unwrap();
    assert!(report.value.interfaces.added.is_empty());
    assert_eq!(report.value.interfaces.updated.len(), 2);

    let node = inventory.node(node_id).unwrap();
    let eno2 = node.interface("eno2").unwrap();
    assert_eq!(eno2.id, eth1_id);
    assert!(eno2.is_allowed(ids::ADMIN_NETWORK));
}

#[rstest]
fn test_rediscovery_removes_missing_interfaces(mut inventory: Inventory) {
    let first = inventory
        .discover_node(MAC, PayloadFixtures::two_nics(MAC, SECOND_MAC))
        .unwrap();
    let node_id = first.value.node_id;
    inventory.allow_network(ids::ADMIN_NETWORK, &[node_id]).unwrap();

    let report = inventory
        .discover_node(MAC, json!({"interfaces": [{"name": "eth0", "mac": MAC}]}))
        .unwrap();
    assert_eq!(report.value.interfaces.removed, vec!["eth1"]);
    assert_eq!(report.value.interfaces.dropped_links, 1);
    assert_eq!(inventory.node(node_id).unwrap().interfaces.len(), 1);
}

#[rstest]
#[case(json!(1000), Some(1000))]
#[case(json!(0), Some(0))]
#[case(json!(-5), None)]
#[case(json!("1000"), None)]
#[case(json!(10.5), None)]
#[case(json!(true), None)]
#[case(Value::Null, None)]
fn test_speed_normalization(
    mut inventory: Inventory,
    #[case] speed: Value,
    #[case] expected: Option<u64>,
) {
    let report = inventory
        .discover_node(
            MAC,
            json!({"interfaces": [{"name": "eth0", "mac": MAC, "max_speed": speed}]}),
        )
        .unwrap();
    let node = inventory.node(report.value.node_id).unwrap();
    assert_eq!(node.meta.interfaces[0].max_speed, expected);
    assert_eq!(node.interfaces[0].max_speed, expected);
}

#[rstest]
#[case(json!([]))]
#[case(json!("eth0"))]
#[case(json!({"cpu": {"total": 2}}))]
#[case(json!({"interfaces": {"name": "eth0"}}))]
fn test_malformed_payload_is_bad_request(mut inventory: Inventory, #[case] payload: Value) {
    let err = inventory.discover_node(MAC, payload).unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(inventory.node_by_mac(MAC).is_none());
}

#[rstest]
fn test_invalid_mac_is_rejected(mut inventory: Inventory) {
    let err = inventory
        .discover_node("not-a-mac", PayloadFixtures::two_nics(MAC, SECOND_MAC))
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}
