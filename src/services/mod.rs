//! Resolver services

pub mod admin_interface;
pub mod discovery;
pub mod inventory;
pub mod networks;
pub mod roles;

pub use admin_interface::{
    resolve_admin_interface, AdminInterface, AdminMatch, CidrMembership, SubnetMembership,
};
pub use discovery::{apply_discovered_interfaces, sync_interfaces, InterfaceSync, MetaUpdate};
pub use inventory::{CascadeReport, DiscoveryReport, Inventory, InventorySnapshot};
pub use networks::{
    allowed_network_ids, assigned_network_ids, assignments_outside_allowed, interface_networks,
    InterfaceNetworks, NetworkRef,
};
pub use roles::{
    active_roles, check_release_compatibility, effective_roles, pending_roles, set_roles,
    RoleAssignment, RoleCatalog,
};
