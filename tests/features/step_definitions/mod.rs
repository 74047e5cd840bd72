//! Step definitions for Cucumber scenarios

pub mod discovery_steps;
