//! Shared data model for docflow: workflow catalogs, execution history and
//! document snapshots as delivered by the collaborator services, plus the
//! derived timeline types produced by the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable identifier of a workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(pub u64);

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StepId {
    fn from(value: u64) -> Self {
        StepId(value)
    }
}

pub type UserId = String;
pub type DocumentId = u64;
pub type DocumentTypeId = u64;

/// Behavioural role of a step, set when the catalog is authored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepRole {
    Entry,
    #[default]
    Intermediate,
    SuccessTerminal,
    FailureTerminal,
}

impl StepRole {
    pub fn is_terminal(self) -> bool {
        matches!(self, StepRole::SuccessTerminal | StepRole::FailureTerminal)
    }
}

/// Tree identity of a step: the same id may legitimately recur at several
/// positions when a process revisits a stage.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StepKey {
    pub id: StepId,
    pub path: Vec<StepId>,
}

impl StepKey {
    pub fn new(id: StepId, path: Vec<StepId>) -> Self {
        Self { id, path }
    }

    /// Path of the parent position, i.e. this path without its last segment.
    pub fn parent_path(&self) -> Option<&[StepId]> {
        self.path.split_last().map(|(_, rest)| rest)
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let segments: Vec<String> = self.path.iter().map(|id| id.to_string()).collect();
        write!(f, "{}@[{}]", self.id, segments.join("/"))
    }
}

/// One step of a workflow catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    pub id: StepId,
    pub name: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub parent_id: Option<StepId>,
    /// Ancestor ids from the root down to and including this step.
    #[serde(default)]
    pub path: Vec<StepId>,
    #[serde(default)]
    pub authorized_users: Vec<UserId>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub role: StepRole,
}

impl StepDefinition {
    pub fn key(&self) -> StepKey {
        StepKey::new(self.id, self.path.clone())
    }
}

/// Allowed move between two steps for one document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRule {
    pub document_type_id: DocumentTypeId,
    pub from_step_id: StepId,
    pub to_step_id: StepId,
    /// Empty means any user may perform the transition.
    #[serde(default)]
    pub authorized_users: Vec<UserId>,
}

impl TransitionRule {
    pub fn is_self_transition(&self) -> bool {
        self.from_step_id == self.to_step_id
    }
}

/// Static definition of a workflow for one document type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowCatalog {
    pub document_type_id: DocumentTypeId,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
    #[serde(default)]
    pub transitions: Vec<TransitionRule>,
}

/// Reference to a step as written by the history source: either a numeric id
/// or free text that may name the step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepReference {
    Id(StepId),
    Text(String),
}

impl StepReference {
    /// Numeric id carried by the reference, including numeric text.
    pub fn as_id(&self) -> Option<StepId> {
        match self {
            StepReference::Id(id) => Some(*id),
            StepReference::Text(text) => text.trim().parse::<u64>().ok().map(StepId),
        }
    }
}

impl fmt::Display for StepReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepReference::Id(id) => write!(f, "#{}", id),
            StepReference::Text(text) => write!(f, "\"{}\"", text),
        }
    }
}

/// One logged execution of a step for a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub step_reference: StepReference,
    /// Locale formatted "date at time" text.
    pub timestamp: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub sequence_ordinal: Option<u64>,
    #[serde(default)]
    pub step_label: Option<String>,
}

/// Snapshot of a tracked document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub type_id: DocumentTypeId,
    #[serde(default)]
    pub current_step_id: Option<StepId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub current_step_label: Option<String>,
}

/// Status of a derived timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Completed,
    Current,
    Pending,
    Branch,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Completed => write!(f, "completed"),
            EntryStatus::Current => write!(f, "current"),
            EntryStatus::Pending => write!(f, "pending"),
            EntryStatus::Branch => write!(f, "branch"),
        }
    }
}

/// Who may perform a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "users", rename_all = "camelCase")]
pub enum Authorization {
    /// No rule exists; the transition is not valid.
    NoRule,
    /// At least one matching rule is open to any user.
    Unrestricted,
    Restricted(BTreeSet<UserId>),
}

impl Authorization {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Authorization::NoRule)
    }

    pub fn permits(&self, user: &str) -> bool {
        match self {
            Authorization::NoRule => false,
            Authorization::Unrestricted => true,
            Authorization::Restricted(users) => users.contains(user),
        }
    }
}

/// Candidate step the document may move to next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextStep {
    pub step_id: StepId,
    pub path: Vec<StepId>,
    pub step_name: String,
    pub authorization: Authorization,
}

/// One row of a reconstructed timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    /// `None` only for the synthetic branch entry.
    pub step_id: Option<StepId>,
    pub path: Vec<StepId>,
    pub step_name: String,
    pub status: EntryStatus,
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_timestamp: Option<String>,
    pub user_id: Option<UserId>,
    pub memo: Option<String>,
    pub order: usize,
    #[serde(default)]
    pub implicit: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<NextStep>,
}

impl TimelineEntry {
    pub fn key(&self) -> Option<StepKey> {
        self.step_id.map(|id| StepKey::new(id, self.path.clone()))
    }
}

/// Strategy used to assemble a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssemblyMode {
    /// Catalog available: history merged with the workflow definition.
    Workflow,
    /// Catalog missing: matched history plus the current step only.
    HistoryOnly,
}
