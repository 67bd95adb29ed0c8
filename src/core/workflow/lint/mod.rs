use crate::core::workflow::tree::{WorkflowTree, WorkflowTreeBuilder};
use docflow_types::WorkflowCatalog;
use serde::Serialize;
use std::fmt;

pub mod rules;
pub use rules::*;

/// Severity levels emitted by catalog lint rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LintSeverity {
    Error,
    Warning,
    Info,
}

impl LintSeverity {
    fn rank(&self) -> u8 {
        match self {
            LintSeverity::Error => 3,
            LintSeverity::Warning => 2,
            LintSeverity::Info => 1,
        }
    }
}

impl fmt::Display for LintSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintSeverity::Error => write!(f, "Error"),
            LintSeverity::Warning => write!(f, "Warning"),
            LintSeverity::Info => write!(f, "Info"),
        }
    }
}

/// Individual finding emitted by a rule.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub code: String,
    pub severity: LintSeverity,
    pub message: String,
    pub location: Option<String>,
    pub suggestion: Option<String>,
}

impl LintResult {
    pub fn new(
        code: impl Into<String>,
        severity: LintSeverity,
        message: impl Into<String>,
        location: Option<String>,
        suggestion: Option<String>,
    ) -> Self {
        Self {
            code: code.into(),
            severity,
            message: message.into(),
            location,
            suggestion,
        }
    }
}

impl fmt::Display for LintResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.severity, self.code, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " ({})", location)?;
        }
        Ok(())
    }
}

/// Trait implemented by catalog lint rules. The tree is built once and shared.
pub trait CatalogLintRule {
    fn validate(&self, catalog: &WorkflowCatalog, tree: &WorkflowTree<'_>) -> Vec<LintResult>;
}

/// Runs every built-in rule over a catalog.
pub struct CatalogLinter {
    rules: Vec<Box<dyn CatalogLintRule>>,
}

impl CatalogLinter {
    pub fn new() -> Self {
        Self {
            rules: built_in_rules(),
        }
    }

    /// Results are sorted by `(severity desc, code asc, location asc)`.
    pub fn run(&self, catalog: &WorkflowCatalog) -> Vec<LintResult> {
        let tree = WorkflowTreeBuilder::build(&catalog.steps);
        let mut results = Vec::new();
        for rule in &self.rules {
            results.extend(rule.validate(catalog, &tree));
        }
        results.sort_by(|a, b| {
            let severity_cmp = b.severity.rank().cmp(&a.severity.rank());
            severity_cmp
                .then(a.code.cmp(&b.code))
                .then(a.location.cmp(&b.location))
        });
        tracing::debug!(
            document_type = catalog.document_type_id,
            findings = results.len(),
            "catalog lint finished"
        );
        results
    }
}

impl Default for CatalogLinter {
    fn default() -> Self {
        Self::new()
    }
}
