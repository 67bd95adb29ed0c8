use serde::Serialize;
use std::fmt;

/// Severity of a non-fatal engine diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Info,
    Warning,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Warning => write!(f, "Warning"),
            DiagnosticSeverity::Info => write!(f, "Info"),
        }
    }
}

/// Conditions the engine absorbs instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    UnresolvedStepReference,
    UnparsableTimestamp,
    MissingWorkflowDefinition,
    OrphanedTreeNode,
    NoValidTransition,
    UnknownTransitionTarget,
    CurrentStepNotInCatalog,
    DuplicateStepPosition,
}

impl DiagnosticKind {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::UnresolvedStepReference => "DOC-TL-001",
            DiagnosticKind::UnparsableTimestamp => "DOC-TL-002",
            DiagnosticKind::MissingWorkflowDefinition => "DOC-TL-003",
            DiagnosticKind::OrphanedTreeNode => "DOC-TL-004",
            DiagnosticKind::NoValidTransition => "DOC-TL-005",
            DiagnosticKind::UnknownTransitionTarget => "DOC-TL-006",
            DiagnosticKind::CurrentStepNotInCatalog => "DOC-TL-007",
            DiagnosticKind::DuplicateStepPosition => "DOC-TL-008",
        }
    }

    pub fn severity(self) -> DiagnosticSeverity {
        match self {
            DiagnosticKind::NoValidTransition => DiagnosticSeverity::Info,
            _ => DiagnosticSeverity::Warning,
        }
    }
}

/// A degraded-but-handled condition reported alongside engine output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub code: &'static str,
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub location: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, location: Option<String>) -> Self {
        Self {
            kind,
            code: kind.code(),
            severity: kind.severity(),
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.severity, self.code, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " ({})", location)?;
        }
        Ok(())
    }
}
