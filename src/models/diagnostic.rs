//! Structured diagnostics returned alongside resolver results

use serde::{Deserialize, Serialize};

use super::NodeId;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// What a diagnostic is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// No rule identified the admin interface; the first interface was used
    AdminInterfaceFallback,
    /// Roles were assigned to a node that is not in a cluster
    NodeWithoutCluster,
    /// A discovered interface descriptor lacked name or MAC and was dropped
    InterfaceSkipped,
    /// A discovery update carried an invalid descriptor; interfaces kept as-is
    InterfaceUpdateRejected,
}

/// A non-fatal event produced by a resolver operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(code: DiagnosticCode, node_id: NodeId, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            node_id: Some(node_id),
            message: message.into(),
        }
    }

    pub fn info(code: DiagnosticCode, node_id: NodeId, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            code,
            node_id: Some(node_id),
            message: message.into(),
        }
    }

    /// Log this diagnostic through `tracing`
    pub fn emit(&self) {
        match self.severity {
            Severity::Warning => tracing::warn!(
                code = ?self.code,
                node_id = ?self.node_id,
                "{}",
                self.message
            ),
            Severity::Info => tracing::info!(
                code = ?self.code,
                node_id = ?self.node_id,
                "{}",
                self.message
            ),
        }
    }
}

/// A result value plus the diagnostics produced while computing it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Resolution<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            diagnostics: vec![],
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostics.push(diagnostic);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics.extend(diagnostics);
        self
    }

    /// True when nothing worth reporting happened
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has(&self, code: DiagnosticCode) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        Resolution {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }

    /// Emit every diagnostic and return the bare value
    pub fn emit(self) -> T {
        for diagnostic in &self.diagnostics {
            diagnostic.emit();
        }
        self.value
    }

    pub fn into_parts(self) -> (T, Vec<Diagnostic>) {
        (self.value, self.diagnostics)
    }
}
