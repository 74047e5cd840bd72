//! Integration tests for metalnode
//!
//! These tests drive the resolver through a populated in-memory inventory.

mod discovery_tests;
mod role_tests;
