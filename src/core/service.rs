#![allow(clippy::result_large_err)]

use crate::core::config::{ConfigValidator, DocflowConfig};
use crate::core::error::AppError;
use crate::core::sources::{CatalogSource, DocumentSource, HistorySource};
use crate::core::types::ErrorCategory;
use crate::core::workflow::progress::{ProgressCalculator, ProgressSummary};
use crate::core::workflow::timeline::{Timeline, TimelineAssembler, TimelineInputs};
use crate::core::workflow::transitions::TransitionResolver;
use crate::core::workflow::tree::WorkflowTreeBuilder;
use docflow_types::{
    Authorization, Document, DocumentId, ExecutionRecord, StepId, TransitionRule, WorkflowCatalog,
};
use serde::Serialize;

/// Timeline together with its progress counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub timeline: Timeline,
    pub summary: ProgressSummary,
}

/// Everything fetched from the collaborators for one document.
struct Snapshot {
    document: Document,
    history: Vec<ExecutionRecord>,
    catalog: Option<WorkflowCatalog>,
}

/// Fetches a document's data through the collaborator seams and hands it to
/// the engine. A missing catalog selects the history-only strategy.
pub struct TimelineService<C, H, D> {
    catalogs: C,
    history: H,
    documents: D,
    assembler: TimelineAssembler,
}

impl<C, H, D> TimelineService<C, H, D>
where
    C: CatalogSource,
    H: HistorySource,
    D: DocumentSource,
{
    pub fn new(catalogs: C, history: H, documents: D, config: &DocflowConfig) -> Result<Self, AppError> {
        ConfigValidator::validate(config)?;
        let assembler = TimelineAssembler::from_config(config)
            .map_err(|err| AppError::new(ErrorCategory::ValidationError, err.to_string()))?;
        Ok(Self {
            catalogs,
            history,
            documents,
            assembler,
        })
    }

    fn snapshot(&self, document_id: DocumentId) -> Result<Snapshot, AppError> {
        let document = self.documents.document(document_id)?;
        let catalog = self.catalogs.catalog(document.type_id)?;
        let history = self.history.history(document_id)?;
        tracing::debug!(
            document_id,
            document_type = document.type_id,
            records = history.len(),
            has_catalog = catalog.is_some(),
            "fetched document snapshot"
        );
        Ok(Snapshot {
            document,
            history,
            catalog,
        })
    }

    fn assemble(&self, snapshot: &Snapshot) -> Timeline {
        self.assembler.assemble(TimelineInputs {
            document: &snapshot.document,
            history: &snapshot.history,
            catalog: snapshot.catalog.as_ref(),
        })
    }

    pub fn timeline(&self, document_id: DocumentId) -> Result<Timeline, AppError> {
        let snapshot = self.snapshot(document_id)?;
        Ok(self.assemble(&snapshot))
    }

    pub fn progress(&self, document_id: DocumentId) -> Result<ProgressReport, AppError> {
        let snapshot = self.snapshot(document_id)?;
        let timeline = self.assemble(&snapshot);
        let summary = ProgressCalculator::summarize(&timeline, snapshot.catalog.as_ref());
        Ok(ProgressReport { timeline, summary })
    }

    /// Who may move the document from its current step to `to`.
    pub fn authorization_for(&self, document_id: DocumentId, to: StepId) -> Result<Authorization, AppError> {
        let document = self.documents.document(document_id)?;
        let Some(from) = document.current_step_id else {
            return Ok(Authorization::NoRule);
        };
        let Some(catalog) = self.catalogs.catalog(document.type_id)? else {
            return Ok(Authorization::NoRule);
        };
        let resolver = self.resolver(&catalog.transitions);
        if to == from && !resolver.can_reassign(document.type_id, from, entry_step_id(&catalog)) {
            return Ok(Authorization::NoRule);
        }
        Ok(resolver.authorized_users(to, from, document.type_id))
    }

    /// Whether the document may be handed to another user without moving.
    pub fn can_reassign(&self, document_id: DocumentId) -> Result<bool, AppError> {
        let document = self.documents.document(document_id)?;
        let Some(step) = document.current_step_id else {
            return Ok(false);
        };
        let Some(catalog) = self.catalogs.catalog(document.type_id)? else {
            return Ok(false);
        };
        Ok(self
            .resolver(&catalog.transitions)
            .can_reassign(document.type_id, step, entry_step_id(&catalog)))
    }

    fn resolver<'r>(&self, rules: &'r [TransitionRule]) -> TransitionResolver<'r> {
        TransitionResolver::new(rules)
            .with_entry_reassignment(self.assembler.settings().allow_entry_reassignment)
    }
}

fn entry_step_id(catalog: &WorkflowCatalog) -> Option<StepId> {
    WorkflowTreeBuilder::build(&catalog.steps).entry_step().map(|key| key.id)
}
