//! Common test utilities and helpers
//!
//! This module provides shared test infrastructure including:
//! - Inventory and payload fixtures
//! - Node factories with unique MACs

pub mod fixtures;

pub use factories::*;
pub use fixtures::*;
