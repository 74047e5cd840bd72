//! Error types and handling
//!
//! Hard failures of resolver operations are reported through [`AppError`].
//! Non-fatal outcomes (policy rejections, ambiguous resolutions) are not
//! errors; they travel as diagnostics next to a successful result, see
//! [`crate::models::Resolution`].

use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Entity already exists or the requested state change is not allowed
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Payload failed field validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Caller broke an operation precondition (e.g. node without interfaces)
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable identifier of the error kind, for callers mapping errors onto
    /// their own transport
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Conflict(_) => "conflict",
            AppError::ValidationError(_) => "validation_error",
            AppError::PreconditionFailed(_) => "precondition_failed",
            AppError::Config(_) => "config_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

/// Serializable error body
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Add details to the error response
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        ErrorResponse::new(err.kind(), err.to_string())
    }
}

// Implement From for common error types

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<ipnetwork::IpNetworkError> for AppError {
    fn from(err: ipnetwork::IpNetworkError) -> Self {
        AppError::ValidationError(format!("invalid network address: {}", err))
    }
}

/// Result type alias for resolver operations
pub type AppResult<T> = Result<T, AppError>;
