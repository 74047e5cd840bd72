//! Input validation utilities

use once_cell::sync::Lazy;
use regex::Regex;

/// Regex for validating colon-separated MAC addresses
static MAC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{2}(:[0-9a-fA-F]{2}){5}$").unwrap());

/// Regex for validating interface names (eth0, enp3s0f1, bond0.100, ...)
static INTERFACE_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9._@-]*$").unwrap());

/// Regex for validating network group names
static NETWORK_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").unwrap());

/// Validate a MAC address
pub fn validate_mac(mac: &str) -> bool {
    MAC_REGEX.is_match(mac)
}

/// Validate an interface name
pub fn validate_interface_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= 128 && INTERFACE_NAME_REGEX.is_match(name)
}

/// Validate a network group name
pub fn validate_network_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= 100 && NETWORK_NAME_REGEX.is_match(name)
}

/// Normalize a MAC address to its stored (lowercase) form
pub fn normalize_mac(mac: &str) -> String {
    mac.trim().to_lowercase()
}

/// `validator` hook for network group names
pub(crate) fn network_name(name: &str) -> Result<(), validator::ValidationError> {
    if validate_network_name(name) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("network_name"))
    }
}
