//! Role assignment through the inventory

use rstest::{fixture, rstest};

use metalnode::models::{DiagnosticCode, RoleTarget};
use metalnode::services::{active_roles, effective_roles, pending_roles, RoleAssignment};
use metalnode::{AppError, Inventory};

use crate::common::{ids, InventoryFixtures, NodeFactory};

#[fixture]
fn inventory() -> Inventory {
    InventoryFixtures::standard()
}

fn add_node(inventory: &mut Inventory, cluster: Option<u64>) -> u64 {
    let factory = NodeFactory::new();
    let mut builder = factory.create().with_interface("eth0");
    if let Some(cluster_id) = cluster {
        builder = builder.in_cluster(cluster_id);
    }
    let node = builder.build();
    let id = node.id;
    inventory.add_node(node).unwrap();
    id
}

#[rstest]
#[case(RoleTarget::Active)]
#[case(RoleTarget::Pending)]
fn test_roles_are_replaced_wholesale(mut inventory: Inventory, #[case] target: RoleTarget) {
    let node_id = add_node(&mut inventory, Some(ids::CLUSTER_A));

    inventory
        .set_node_roles(node_id, ["controller", "cinder"], target)
        .unwrap();
    let resolution = inventory
        .set_node_roles(node_id, ["compute"], target)
        .unwrap();
    assert!(resolution.value.is_applied());

    let node = inventory.node(node_id).unwrap();
    let names = match target {
        RoleTarget::Active => active_roles(node),
        RoleTarget::Pending => pending_roles(node),
    };
    assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["compute"]);
}

#[rstest]
fn test_roles_resolve_within_cluster_release(mut inventory: Inventory) {
    let node_id = add_node(&mut inventory, Some(ids::CLUSTER_B));

    let resolution = inventory
        .set_node_roles(node_id, ["compute", "controller", "ceph-osd"], RoleTarget::Active)
        .unwrap();
    match resolution.value {
        RoleAssignment::Applied { roles, dropped, .. } => {
            assert_eq!(roles.into_iter().collect::<Vec<_>>(), vec!["ceph-osd", "compute"]);
            assert_eq!(dropped.into_iter().collect::<Vec<_>>(), vec!["controller"]);
        }
        other => panic!("expected applied assignment, got {:?}", other),
    }

    let node = inventory.node(node_id).unwrap();
    assert!(node.roles.iter().all(|r| r.release_id == ids::RELEASE_B));
}

#[rstest]
fn test_empty_list_clears_roles(mut inventory: Inventory) {
    let node_id = add_node(&mut inventory, Some(ids::CLUSTER_A));
    inventory
        .set_node_roles(node_id, ["controller"], RoleTarget::Active)
        .unwrap();

    inventory
        .set_node_roles(node_id, Vec::<String>::new(), RoleTarget::Active)
        .unwrap();
    assert!(inventory.node(node_id).unwrap().roles.is_empty());
}

#[rstest]
fn test_pending_and_active_are_independent(mut inventory: Inventory) {
    let node_id = add_node(&mut inventory, Some(ids::CLUSTER_A));
    inventory
        .set_node_roles(node_id, ["controller"], RoleTarget::Active)
        .unwrap();
    inventory
        .set_node_roles(node_id, ["compute", "controller"], RoleTarget::Pending)
        .unwrap();

    let node = inventory.node(node_id).unwrap();
    assert_eq!(active_roles(node).len(), 1);
    assert_eq!(pending_roles(node).len(), 2);
    assert_eq!(effective_roles(node).len(), 2);
}

#[rstest]
fn test_node_outside_cluster_is_skipped(mut inventory: Inventory) {
    let node_id = add_node(&mut inventory, None);

    let resolution = inventory
        .set_node_roles(node_id, ["controller"], RoleTarget::Pending)
        .unwrap();
    assert_eq!(
        resolution.value,
        RoleAssignment::Skipped { target: RoleTarget::Pending }
    );
    assert!(resolution.has(DiagnosticCode::NodeWithoutCluster));
    assert!(inventory.node(node_id).unwrap().pending_roles.is_empty());
}

#[rstest]
fn test_moving_node_between_clusters_clears_roles(mut inventory: Inventory) {
    let node_id = add_node(&mut inventory, Some(ids::CLUSTER_A));
    inventory
        .set_node_roles(node_id, ["compute"], RoleTarget::Active)
        .unwrap();

    inventory
        .assign_node_to_cluster(node_id, Some(ids::CLUSTER_B))
        .unwrap();
    assert!(inventory.node(node_id).unwrap().roles.is_empty());

    inventory
        .set_node_roles(node_id, ["compute"], RoleTarget::Active)
        .unwrap();
    assert_eq!(inventory.node(node_id).unwrap().roles[0].id, 4);
}

#[rstest]
fn test_unknown_node_is_not_found(mut inventory: Inventory) {
    let err = inventory
        .set_node_roles(99, ["compute"], RoleTarget::Active)
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
