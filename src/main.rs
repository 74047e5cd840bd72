//! Metalnode - inspect node networking and roles in an inventory snapshot
//!
//! Loads an inventory snapshot and prints, for every node, the resolved
//! admin interface, its role sets and the networks of each interface.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{fmt, fmt::MakeWriter, prelude::*, EnvFilter, Layer, Registry};

use metalnode::config::{LogFormat, LogTarget, LoggingConfig};
use metalnode::models::{Diagnostic, Node, NodeId, NodeStatus};
use metalnode::services::{self, AdminMatch, CidrMembership, InterfaceNetworks, InventorySnapshot};
use metalnode::utils::ErrorResponse;
use metalnode::{AppConfig, Inventory};

/// Command line options
#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    inventory: Option<PathBuf>,
    node: Option<NodeId>,
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!("metalnode {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let options = parse_args(&args)?;

    // Load configuration first (before logging, so we know log format)
    let config = AppConfig::load_from(options.config.clone())
        .context("Failed to load configuration")?;

    // The guard must outlive every log call so buffered lines reach the file
    let _log_guard = init_logging(&config.logging);

    let inventory_path = options
        .inventory
        .or_else(|| config.inventory_path.clone())
        .context("No inventory given (use --inventory or METALNODE_INVENTORY)")?;

    info!("Loading inventory from {:?}", inventory_path);
    let snapshot = InventorySnapshot::load(&inventory_path)?;
    let inventory = Inventory::from_snapshot(snapshot, &config.resolver)
        .context("Inventory snapshot is inconsistent")?;

    let reports: Vec<NodeReport> = inventory
        .nodes()
        .filter(|node| options.node.is_none_or(|id| id == node.id))
        .map(|node| NodeReport::build(&inventory, node))
        .collect();

    if let Some(id) = options.node {
        if reports.is_empty() {
            anyhow::bail!("Node {} not found in inventory", id);
        }
    }

    info!("Resolved {} node(s)", reports.len());
    println!("{}", serde_json::to_string_pretty(&reports)?);

    Ok(())
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .with_context(|| format!("{} expects a value", flag))
        };
        match arg.as_str() {
            "-c" | "--config" => options.config = Some(PathBuf::from(value(arg.as_str())?)),
            "-i" | "--inventory" => options.inventory = Some(PathBuf::from(value(arg.as_str())?)),
            "-n" | "--node" => {
                let raw = value(arg.as_str())?;
                options.node = Some(
                    raw.parse()
                        .with_context(|| format!("Invalid node id: {}", raw))?,
                );
            }
            other => anyhow::bail!("Unknown argument: {} (see --help)", other),
        }
    }

    Ok(options)
}

/// Admin interface section of a node report
#[derive(Debug, Serialize)]
struct AdminReport {
    name: String,
    mac: String,
    matched_by: AdminMatch,
}

#[derive(Debug, Serialize)]
struct RoleReport {
    active: Vec<String>,
    pending: Vec<String>,
    effective: Vec<String>,
}

#[derive(Debug, Serialize)]
struct NodeReport {
    id: NodeId,
    name: String,
    mac: String,
    status: NodeStatus,
    cluster_id: Option<u64>,
    offline: bool,
    needs_reprovision: bool,
    needs_redeploy: bool,
    needs_redeletion: bool,
    admin_interface: Option<AdminReport>,
    roles: RoleReport,
    interfaces: Vec<InterfaceNetworks>,
    /// (interface id, network id) pairs assigned but not allowed
    assigned_outside_allowed: Vec<(u64, u64)>,
    diagnostics: Vec<Diagnostic>,
    errors: Vec<ErrorResponse>,
}

impl NodeReport {
    fn build(inventory: &Inventory, node: &Node) -> Self {
        let mut diagnostics = vec![];
        let mut errors = vec![];

        let admin_interface = match inventory.resolve_admin_interface(node.id, &CidrMembership) {
            Ok(resolution) => {
                let (admin, found) = resolution.into_parts();
                diagnostics.extend(found);
                Some(AdminReport {
                    name: admin.interface.name.clone(),
                    mac: admin.interface.mac.clone(),
                    matched_by: admin.matched_by,
                })
            }
            Err(e) => {
                warn!(node_id = node.id, "Admin interface not resolved: {}", e);
                errors.push(
                    ErrorResponse::from(&e)
                        .with_details(serde_json::json!({ "node_id": node.id })),
                );
                None
            }
        };

        for diagnostic in &diagnostics {
            diagnostic.emit();
        }

        Self {
            id: node.id,
            name: node.full_name(),
            mac: node.mac.clone(),
            status: node.status,
            cluster_id: node.cluster_id,
            offline: node.offline(),
            needs_reprovision: node.needs_reprovision(),
            needs_redeploy: node.needs_redeploy(),
            needs_redeletion: node.needs_redeletion(),
            admin_interface,
            roles: RoleReport {
                active: services::active_roles(node).into_iter().collect(),
                pending: services::pending_roles(node).into_iter().collect(),
                effective: services::effective_roles(node).into_iter().collect(),
            },
            interfaces: services::interface_networks(node, inventory.network_groups()),
            assigned_outside_allowed: services::assignments_outside_allowed(node),
            diagnostics,
            errors,
        }
    }
}

/// Initialize the logging/tracing infrastructure
///
/// Console output goes to stderr; stdout carries the report.
fn init_logging(log_config: &LoggingConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&log_config.level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![];
    let mut guard = None;

    if matches!(log_config.target, LogTarget::Console | LogTarget::Both) {
        layers.push(format_layer(&log_config.format, std::io::stderr));
    }

    if matches!(log_config.target, LogTarget::File | LogTarget::Both) {
        let (writer, file_guard) = create_file_writer(log_config);
        layers.push(format_layer(&log_config.format, writer));
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    guard
}

/// Build one formatting layer for the configured format
fn format_layer<W>(format: &LogFormat, writer: W) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer);
    match format {
        LogFormat::Json => layer.json().with_target(true).boxed(),
        LogFormat::Compact => layer.compact().with_target(false).boxed(),
        LogFormat::Pretty => layer
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
    }
}

/// Create a file writer with optional daily rotation
fn create_file_writer(
    log_config: &LoggingConfig,
) -> (
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
) {
    if let Err(e) = std::fs::create_dir_all(&log_config.log_dir) {
        eprintln!(
            "Warning: Failed to create log directory {:?}: {}",
            log_config.log_dir, e
        );
    }

    let file_appender = if log_config.daily_rotation {
        tracing_appender::rolling::daily(&log_config.log_dir, &log_config.log_prefix)
    } else {
        tracing_appender::rolling::never(&log_config.log_dir, &log_config.log_prefix)
    };

    tracing_appender::non_blocking(file_appender)
}

fn print_help() {
    println!(
        r#"metalnode {}

USAGE:
    metalnode [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    -c, --config <FILE>     Configuration file to use
    -i, --inventory <FILE>  Inventory snapshot (YAML) to inspect
    -n, --node <ID>         Only report on this node

ENVIRONMENT:
    METALNODE_CONFIG         Path to configuration file
    METALNODE_INVENTORY      Inventory snapshot path
    METALNODE_ADMIN_NETWORK  Name of the admin network group (default: admin)
    METALNODE_LOG_FORMAT     pretty, json or compact
    METALNODE_LOG_TARGET     console, file or both
    METALNODE_LOG_DIR        Directory for log files
    RUST_LOG                 Log filter

CONFIGURATION:
    The configuration file is looked up in the following order:
    1. --config
    2. METALNODE_CONFIG
    3. ./metalnode.yaml
    4. ./config/metalnode.yaml
    5. /etc/metalnode/config.yaml
    6. <user config dir>/metalnode/config.yaml"#,
        env!("CARGO_PKG_VERSION")
    );
}
