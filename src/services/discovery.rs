//! Discovery metadata intake
//!
//! First contact is lenient: descriptors without a name or MAC are dropped
//! and the rest are kept. Later updates are all-or-nothing for interfaces: a
//! single bad descriptor keeps the stored interface list while the remaining
//! payload still replaces the old metadata.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{
    Diagnostic, DiagnosticCode, InterfaceDescriptor, InterfaceId, Node, NodeInterface, NodeMeta,
    Resolution,
};
use crate::utils::{validation, AppError, AppResult};

const SPEED_FIELDS: [&str; 2] = ["max_speed", "current_speed"];

/// Result of applying a discovery payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MetaUpdate {
    /// Interfaces were replaced by the validated descriptors
    Applied { stored: usize, dropped: usize },
    /// Interfaces were left as they were
    Rejected { retained: usize },
}

impl MetaUpdate {
    pub fn is_applied(&self) -> bool {
        matches!(self, MetaUpdate::Applied { .. })
    }
}

/// Apply a discovery payload to `node.meta`.
///
/// `payload` must be an object with an `interfaces` array; anything else is
/// a caller error.
pub fn apply_discovered_interfaces(
    node: &mut Node,
    payload: Value,
    first_contact: bool,
) -> AppResult<Resolution<MetaUpdate>> {
    let Value::Object(mut rest) = payload else {
        return Err(AppError::BadRequest(
            "discovery payload must be an object".to_string(),
        ));
    };

    let entries = match rest.remove("interfaces") {
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(AppError::BadRequest(
                "discovery payload 'interfaces' must be a list".to_string(),
            ))
        }
        None => {
            return Err(AppError::BadRequest(
                "discovery payload has no 'interfaces'".to_string(),
            ))
        }
    };

    if first_contact {
        Ok(create_meta(node, entries, rest))
    } else {
        Ok(update_meta(node, entries, rest))
    }
}

fn create_meta(
    node: &mut Node,
    entries: Vec<Value>,
    rest: Map<String, Value>,
) -> Resolution<MetaUpdate> {
    let mut diagnostics = vec![];
    let mut interfaces = vec![];

    for entry in entries {
        match clean_descriptor(&entry) {
            Some(descriptor) => interfaces.push(descriptor),
            None => diagnostics.push(Diagnostic::warning(
                DiagnosticCode::InterfaceSkipped,
                node.id,
                format!("Invalid interface data: {}. Skipping interface.", entry),
            )),
        }
    }

    let outcome = MetaUpdate::Applied {
        stored: interfaces.len(),
        dropped: diagnostics.len(),
    };
    node.meta = NodeMeta {
        interfaces,
        extra: rest,
    };

    Resolution::new(outcome).with_diagnostics(diagnostics)
}

fn update_meta(
    node: &mut Node,
    entries: Vec<Value>,
    rest: Map<String, Value>,
) -> Resolution<MetaUpdate> {
    let mut interfaces = Vec::with_capacity(entries.len());

    for entry in &entries {
        let Some(descriptor) = clean_descriptor(entry) else {
            let retained = std::mem::take(&mut node.meta.interfaces);
            let outcome = MetaUpdate::Rejected {
                retained: retained.len(),
            };
            node.meta = NodeMeta {
                interfaces: retained,
                extra: rest,
            };
            return Resolution::new(outcome).with_diagnostic(Diagnostic::warning(
                DiagnosticCode::InterfaceUpdateRejected,
                node.id,
                format!(
                    "Invalid interface data: {}. Interfaces are not updated.",
                    entry
                ),
            ));
        };
        interfaces.push(descriptor);
    }

    let outcome = MetaUpdate::Applied {
        stored: interfaces.len(),
        dropped: 0,
    };
    node.meta = NodeMeta {
        interfaces,
        extra: rest,
    };
    Resolution::new(outcome)
}

/// Validate one raw descriptor and normalize its speed fields.
///
/// Returns `None` when name or MAC is missing or empty.
fn clean_descriptor(entry: &Value) -> Option<InterfaceDescriptor> {
    let object = entry.as_object()?;
    let name = non_empty_str(object.get("name"))?;
    let mac = non_empty_str(object.get("mac"))?;

    let mut extra = object.clone();
    extra.remove("name");
    extra.remove("mac");
    for field in SPEED_FIELDS {
        extra.remove(field);
    }

    Some(InterfaceDescriptor {
        name: name.to_string(),
        mac: mac.to_string(),
        max_speed: normalize_speed(object.get("max_speed")),
        current_speed: normalize_speed(object.get("current_speed")),
        extra,
    })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Non-negative integers pass through; anything else becomes unknown
fn normalize_speed(value: Option<&Value>) -> Option<u64> {
    value.and_then(Value::as_u64)
}

/// What happened to a node's interface rows during a sync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceSync {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    /// Network link rows deleted along with removed interfaces
    pub dropped_links: usize,
}

/// Rebuild the interface rows of `node` from its stored metadata.
///
/// Rows are matched to descriptors by MAC; matched rows keep their id and
/// network links. Rows without a descriptor are deleted together with their
/// links. `next_id` allocates ids for new rows.
pub fn sync_interfaces<F>(node: &mut Node, mut next_id: F) -> InterfaceSync
where
    F: FnMut() -> InterfaceId,
{
    // Several rows may share a MAC (VLAN sub-interfaces); each one is
    // either matched or reported as removed.
    let mut existing: HashMap<String, Vec<NodeInterface>> = HashMap::new();
    for interface in std::mem::take(&mut node.interfaces) {
        existing
            .entry(validation::normalize_mac(&interface.mac))
            .or_default()
            .push(interface);
    }

    let mut sync = InterfaceSync::default();
    let mut interfaces = Vec::with_capacity(node.meta.interfaces.len());

    for descriptor in &node.meta.interfaces {
        let mac = validation::normalize_mac(&descriptor.mac);
        let interface = match existing
            .get_mut(&mac)
            .and_then(|rows| take_row(rows, &descriptor.name))
        {
            Some(mut interface) => {
                interface.refresh_from(descriptor);
                sync.updated.push(interface.name.clone());
                interface
            }
            None => {
                let mut interface = NodeInterface::new(next_id(), &descriptor.name, &mac);
                interface.refresh_from(descriptor);
                sync.added.push(interface.name.clone());
                interface
            }
        };
        interfaces.push(interface);
    }

    for interface in existing.into_values().flatten() {
        sync.dropped_links += interface.link_count();
        sync.removed.push(interface.name);
    }
    sync.removed.sort();

    interfaces.sort_by(|a, b| a.name.cmp(&b.name));
    node.interfaces = interfaces;

    tracing::debug!(
        node_id = node.id,
        added = sync.added.len(),
        updated = sync.updated.len(),
        removed = sync.removed.len(),
        "Synchronized node interfaces"
    );

    sync
}

/// Take the row named `name` out of `rows`, or the first one
fn take_row(rows: &mut Vec<NodeInterface>, name: &str) -> Option<NodeInterface> {
    if rows.is_empty() {
        return None;
    }
    let pos = rows.iter().position(|i| i.name == name).unwrap_or(0);
    Some(rows.remove(pos))
}
