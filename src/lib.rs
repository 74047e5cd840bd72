//! Metalnode library
//!
//! Node network and role resolution for a bare-metal deployment manager:
//! picking the admin interface of a node, replacing its role sets against
//! the cluster release, and folding discovery reports into stored
//! interface metadata.

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use services::Inventory;
pub use utils::{AppError, AppResult};
