pub mod config;
pub mod error;
pub mod service;
pub mod sources;
pub mod types;
pub mod workflow;

pub use config::{ConfigLoader, ConfigValidator, DocflowConfig};
pub use error::AppError;
pub use service::{ProgressReport, TimelineService};
pub use sources::{
    CatalogSource, DocumentSource, FileCatalogSource, FileDocumentSource, FileHistorySource,
    HistorySource, NoCatalog,
};
pub use types::*;
pub use workflow::{
    CatalogLinter, Diagnostic, DiagnosticKind, ProgressCalculator, ProgressSummary, StepMatcher,
    Timeline, TimelineAssembler, TimelineInputs, TransitionResolver, WorkflowTreeBuilder,
};
