//! Workflow history reconstruction engine.
//!
//! Everything in here is synchronous and free of I/O; callers fetch the
//! catalog, history and document snapshot first (see [`crate::core::sources`]).

pub mod diagnostics;
pub mod dot;
pub mod lint;
pub mod matcher;
pub mod progress;
pub mod timeline;
pub mod timestamp;
pub mod transitions;
pub mod tree;

pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSeverity};
pub use lint::{CatalogLinter, LintResult, LintSeverity};
pub use matcher::{MatchStrategy, StepMatch, StepMatcher};
pub use progress::{ProgressCalculator, ProgressSummary};
pub use timeline::{Timeline, TimelineAssembler, TimelineInputs};
pub use timestamp::{TimestampError, TimestampParser};
pub use transitions::TransitionResolver;
pub use tree::{WorkflowTree, WorkflowTreeBuilder};
