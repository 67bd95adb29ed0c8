//! Timeline assembly: one ordered, deduplicated account of a document's past,
//! present and possible next steps.
//!
//! Two strategies sit behind [`TimelineAssembler::assemble`]. With a catalog the
//! history is matched against the workflow definition and next steps are
//! inferred from the transition rules. Without one, only history that carries a
//! step id and the current step are reported.

use crate::core::config::{DocflowConfig, TimelineSettings};
use crate::core::workflow::diagnostics::{Diagnostic, DiagnosticKind};
use crate::core::workflow::matcher::{StepMatch, StepMatcher};
use crate::core::workflow::timestamp::{TimestampError, TimestampParser};
use crate::core::workflow::transitions::TransitionResolver;
use crate::core::workflow::tree::{WorkflowTree, WorkflowTreeBuilder};
use chrono::{DateTime, Utc};
use docflow_types::{
    AssemblyMode, Document, DocumentId, EntryStatus, ExecutionRecord, NextStep, StepId, StepKey,
    TimelineEntry, UserId, WorkflowCatalog,
};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};

/// Separator used to label the synthetic branch entry.
pub const BRANCH_LABEL_SEPARATOR: &str = " / ";

/// Reconstructed timeline of a single document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub document_id: DocumentId,
    pub mode: AssemblyMode,
    pub entries: Vec<TimelineEntry>,
    /// Full candidate set behind the trailing pending or branch entry.
    pub next_steps: Vec<NextStep>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Timeline {
    pub fn current(&self) -> Option<&TimelineEntry> {
        self.entries
            .iter()
            .find(|entry| entry.status == EntryStatus::Current)
    }

    pub fn count(&self, status: EntryStatus) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status == status)
            .count()
    }

    /// No further step can follow the current one.
    pub fn is_terminal(&self) -> bool {
        self.next_steps.is_empty()
    }
}

/// Borrowed inputs of one assembly run.
#[derive(Debug, Clone, Copy)]
pub struct TimelineInputs<'a> {
    pub document: &'a Document,
    pub history: &'a [ExecutionRecord],
    pub catalog: Option<&'a WorkflowCatalog>,
}

/// History record with its parsed instant and input position.
struct Stamped<'r> {
    record: &'r ExecutionRecord,
    at: Option<DateTime<Utc>>,
    parse_error: Option<TimestampError>,
    position: usize,
}

/// Entry under construction.
struct Draft {
    key: StepKey,
    name: String,
    status: EntryStatus,
    at: Option<DateTime<Utc>>,
    raw: Option<String>,
    parse_error: Option<TimestampError>,
    user_id: Option<UserId>,
    memo: Option<String>,
    implicit: bool,
    from_record: bool,
    sequence: Option<u64>,
    position: usize,
    declaration: usize,
}

impl Draft {
    fn from_record(key: StepKey, name: String, item: &Stamped<'_>, declaration: usize) -> Self {
        Draft {
            key,
            name,
            status: EntryStatus::Completed,
            at: item.at,
            raw: Some(item.record.timestamp.clone()),
            parse_error: item.parse_error.clone(),
            user_id: item.record.user_id.clone(),
            memo: item.record.memo.clone(),
            implicit: false,
            from_record: true,
            sequence: item.record.sequence_ordinal,
            position: item.position,
            declaration,
        }
    }

    fn without_record(key: StepKey, name: String, status: EntryStatus, declaration: usize) -> Self {
        Draft {
            key,
            name,
            status,
            at: None,
            raw: None,
            parse_error: None,
            user_id: None,
            memo: None,
            implicit: false,
            from_record: false,
            sequence: None,
            position: usize::MAX,
            declaration,
        }
    }

    /// Recency rank: parsable instants first, then explicit ordinals, then input order.
    /// A missing ordinal ranks below any present one, as in [`chronological`].
    fn recency(&self) -> (bool, Option<DateTime<Utc>>, Option<u64>, usize) {
        let position = if self.from_record { self.position } else { 0 };
        (self.at.is_some(), self.at, self.sequence, position)
    }
}

/// Merges execution history, catalog and transition data into a [`Timeline`].
///
/// Assembly is a pure function of its inputs: it never mutates them and holds
/// no state between calls.
#[derive(Debug, Clone)]
pub struct TimelineAssembler {
    settings: TimelineSettings,
    parser: TimestampParser,
}

impl TimelineAssembler {
    pub fn new(settings: TimelineSettings, parser: TimestampParser) -> Self {
        Self { settings, parser }
    }

    pub fn from_config(config: &DocflowConfig) -> Result<Self, TimestampError> {
        Ok(Self::new(
            config.timeline.clone(),
            TimestampParser::new(&config.timestamps)?,
        ))
    }

    pub fn settings(&self) -> &TimelineSettings {
        &self.settings
    }

    pub fn assemble(&self, inputs: TimelineInputs<'_>) -> Timeline {
        match inputs.catalog {
            Some(catalog) if !catalog.steps.is_empty() => {
                self.assemble_workflow(inputs.document, inputs.history, catalog)
            }
            _ => self.assemble_history_only(inputs.document, inputs.history),
        }
    }

    fn stamp<'r>(&self, history: &'r [ExecutionRecord]) -> Vec<Stamped<'r>> {
        let mut stamped: Vec<Stamped<'r>> = history
            .iter()
            .enumerate()
            .map(|(position, record)| {
                let (at, parse_error) = match self.parser.parse(&record.timestamp) {
                    Ok(at) => (Some(at), None),
                    Err(err) => (None, Some(err)),
                };
                Stamped {
                    record,
                    at,
                    parse_error,
                    position,
                }
            })
            .collect();
        stamped.sort_by(chronological);
        stamped
    }

    fn assemble_workflow(
        &self,
        document: &Document,
        history: &[ExecutionRecord],
        catalog: &WorkflowCatalog,
    ) -> Timeline {
        let tree = WorkflowTreeBuilder::build(&catalog.steps);
        let matcher = StepMatcher::new(&tree);
        let mut diagnostics: Vec<Diagnostic> = tree.diagnostics().to_vec();
        let stamped = self.stamp(history);

        let mut groups: BTreeMap<StepKey, &Stamped<'_>> = BTreeMap::new();
        let mut previous: Option<&StepKey> = None;
        for item in &stamped {
            let candidates = match matcher.resolve(&item.record.step_reference) {
                StepMatch::Resolved { candidates, .. } => candidates,
                StepMatch::Unresolved => {
                    diagnostics.push(unresolved_reference(item));
                    continue;
                }
            };
            let chosen = candidates
                .iter()
                .copied()
                .find(|candidate| previous.is_some() && tree.parent_of(candidate) == previous)
                .or_else(|| candidates.first().copied());
            let Some(key) = chosen else {
                continue;
            };
            previous = Some(key);
            keep_most_recent(&mut groups, key.clone(), item);
        }

        let mut drafts: Vec<Draft> = groups
            .into_iter()
            .map(|(key, item)| {
                let name = tree
                    .lookup(&key)
                    .map(|step| step.name.clone())
                    .unwrap_or_default();
                let declaration = tree.declaration_index(&key).unwrap_or(usize::MAX);
                Draft::from_record(key, name, item, declaration)
            })
            .collect();

        let entry_key = tree.entry_step().cloned();
        if let Some(entry) = &entry_key {
            if self.settings.synthesize_entry && !drafts.iter().any(|d| d.key.id == entry.id) {
                let name = tree
                    .lookup(entry)
                    .map(|step| step.name.clone())
                    .unwrap_or_default();
                let declaration = tree.declaration_index(entry).unwrap_or(0);
                let mut implicit =
                    Draft::without_record(entry.clone(), name, EntryStatus::Completed, declaration);
                implicit.at = Some(document.created_at);
                implicit.implicit = true;
                tracing::debug!(document_id = document.id, step = %entry, "synthesizing unlogged entry step");
                drafts.push(implicit);
            }
        }

        let current_key = document
            .current_step_id
            .and_then(|current| self.place_current(current, &tree, &mut drafts, &mut diagnostics));

        let next_steps = match &current_key {
            Some(current) => self.next_steps(document, catalog, &tree, current, &drafts, &mut diagnostics),
            None => Vec::new(),
        };

        finish(
            document.id,
            AssemblyMode::Workflow,
            drafts,
            entry_key.as_ref(),
            next_steps,
            diagnostics,
        )
    }

    /// Force the document's current step to `current`. History placement wins
    /// unless the latest entry has an unvisited child position for the step,
    /// which means the document was sent back there and not logged yet.
    /// Returns the key of the current entry.
    fn place_current(
        &self,
        current: StepId,
        tree: &WorkflowTree<'_>,
        drafts: &mut Vec<Draft>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<StepKey> {
        let positions = tree.positions_of(current);
        let anchor = drafts
            .iter()
            .max_by_key(|draft| draft.recency())
            .map(|draft| draft.key.clone());
        let revisit = anchor.as_ref().and_then(|anchor| {
            positions
                .iter()
                .copied()
                .find(|candidate| {
                    tree.parent_of(candidate) == Some(anchor)
                        && !drafts.iter().any(|draft| &draft.key == *candidate)
                })
                .cloned()
        });
        let existing = drafts
            .iter()
            .enumerate()
            .filter(|(_, draft)| draft.key.id == current)
            .max_by_key(|(_, draft)| draft.recency())
            .map(|(idx, _)| idx);

        if let Some(idx) = existing {
            if revisit.is_none() || anchor.as_ref() == Some(&drafts[idx].key) {
                drafts[idx].status = EntryStatus::Current;
                return Some(drafts[idx].key.clone());
            }
        }

        if positions.is_empty() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::CurrentStepNotInCatalog,
                format!("current step {} is not defined in the workflow catalog", current),
                Some(current.to_string()),
            ));
            return None;
        }

        let key = match revisit {
            Some(key) => key,
            None => positions.first().copied()?.clone(),
        };
        let step = tree.lookup(&key)?;
        let declaration = tree.declaration_index(&key).unwrap_or(usize::MAX);
        drafts.push(Draft::without_record(
            key.clone(),
            step.name.clone(),
            EntryStatus::Current,
            declaration,
        ));
        Some(key)
    }

    fn next_steps(
        &self,
        document: &Document,
        catalog: &WorkflowCatalog,
        tree: &WorkflowTree<'_>,
        current: &StepKey,
        drafts: &[Draft],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<NextStep> {
        let resolver = TransitionResolver::new(&catalog.transitions)
            .with_entry_reassignment(self.settings.allow_entry_reassignment);
        let present: HashSet<&StepKey> = drafts.iter().map(|draft| &draft.key).collect();
        let children = tree.children_of(current);

        let mut next = Vec::new();
        for target in resolver.next_step_ids(document.type_id, current.id) {
            let positions = tree.positions_of(target);
            let Some(key) = positions
                .iter()
                .copied()
                .find(|candidate| children.contains(candidate))
                .or_else(|| {
                    positions
                        .iter()
                        .copied()
                        .find(|candidate| !present.contains(candidate))
                })
                .or_else(|| positions.first().copied())
            else {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnknownTransitionTarget,
                    format!(
                        "transition from step {} targets step {} which is not in the catalog",
                        current.id, target
                    ),
                    Some(current.to_string()),
                ));
                continue;
            };
            if present.contains(key) {
                continue;
            }
            let Some(step) = tree.lookup(key) else {
                continue;
            };
            next.push(NextStep {
                step_id: target,
                path: key.path.clone(),
                step_name: step.name.clone(),
                authorization: resolver.authorized_users(target, current.id, document.type_id),
            });
        }

        if next.is_empty() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::NoValidTransition,
                format!("step {} has no further transitions; timeline is terminal", current.id),
                Some(current.to_string()),
            ));
        } else if next.len() > 1 {
            tracing::debug!(
                document_id = document.id,
                candidates = next.len(),
                "multiple next steps; emitting branch entry"
            );
        }
        next
    }

    fn assemble_history_only(&self, document: &Document, history: &[ExecutionRecord]) -> Timeline {
        tracing::warn!(
            document_id = document.id,
            document_type = document.type_id,
            "workflow catalog unavailable; assembling from history only"
        );
        let mut diagnostics = vec![Diagnostic::new(
            DiagnosticKind::MissingWorkflowDefinition,
            format!(
                "no workflow catalog for document type {}; showing matched history and current step only",
                document.type_id
            ),
            Some(document.type_id.to_string()),
        )];
        let stamped = self.stamp(history);

        let mut first_seen: BTreeMap<StepId, usize> = BTreeMap::new();
        let mut labels: BTreeMap<StepId, String> = BTreeMap::new();
        let mut groups: BTreeMap<StepKey, &Stamped<'_>> = BTreeMap::new();
        for item in &stamped {
            let Some(id) = item.record.step_reference.as_id() else {
                diagnostics.push(unresolved_reference(item));
                continue;
            };
            let seen = first_seen.len();
            first_seen.entry(id).or_insert(seen);
            if let Some(label) = &item.record.step_label {
                labels.insert(id, label.clone());
            }
            keep_most_recent(&mut groups, StepKey::new(id, vec![id]), item);
        }

        let mut drafts: Vec<Draft> = groups
            .into_iter()
            .map(|(key, item)| {
                let name = labels
                    .get(&key.id)
                    .cloned()
                    .unwrap_or_else(|| format!("#{}", key.id));
                let declaration = first_seen.get(&key.id).copied().unwrap_or(usize::MAX);
                Draft::from_record(key, name, item, declaration)
            })
            .collect();

        if let Some(current) = document.current_step_id {
            match drafts.iter_mut().find(|draft| draft.key.id == current) {
                Some(existing) => existing.status = EntryStatus::Current,
                None => {
                    let name = document
                        .current_step_label
                        .clone()
                        .or_else(|| labels.get(&current).cloned())
                        .unwrap_or_else(|| format!("#{}", current));
                    drafts.push(Draft::without_record(
                        StepKey::new(current, vec![current]),
                        name,
                        EntryStatus::Current,
                        usize::MAX,
                    ));
                }
            }
        }

        finish(
            document.id,
            AssemblyMode::HistoryOnly,
            drafts,
            None,
            Vec::new(),
            diagnostics,
        )
    }
}

fn unresolved_reference(item: &Stamped<'_>) -> Diagnostic {
    tracing::debug!(reference = %item.record.step_reference, "dropping unresolved history record");
    Diagnostic::new(
        DiagnosticKind::UnresolvedStepReference,
        format!(
            "history record {} references unknown step {}",
            item.position, item.record.step_reference
        ),
        Some(format!("history[{}]", item.position)),
    )
}

/// Keep the most recent record per position. Records arrive in chronological
/// order, so later ones replace earlier ones unless that would trade a parsable
/// instant for an unparsable one.
fn keep_most_recent<'s, 'r>(
    groups: &mut BTreeMap<StepKey, &'s Stamped<'r>>,
    key: StepKey,
    item: &'s Stamped<'r>,
) {
    match groups.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(item);
        }
        Entry::Occupied(mut slot) => {
            if item.at.is_some() || slot.get().at.is_none() {
                slot.insert(item);
            }
        }
    }
}

fn some_first<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Oldest first. Undated records follow dated ones; a missing ordinal is older
/// than any present one.
fn chronological(a: &Stamped<'_>, b: &Stamped<'_>) -> Ordering {
    some_first(a.at, b.at)
        .then_with(|| a.record.sequence_ordinal.cmp(&b.record.sequence_ordinal))
        .then(a.position.cmp(&b.position))
}

/// Ordering bucket: entry step, dated history, undated history, the rest.
fn bucket(draft: &Draft, entry: Option<&StepKey>) -> u8 {
    if entry == Some(&draft.key) {
        0
    } else if draft.at.is_some() {
        1
    } else if draft.from_record {
        2
    } else {
        3
    }
}

fn finish(
    document_id: DocumentId,
    mode: AssemblyMode,
    mut drafts: Vec<Draft>,
    entry: Option<&StepKey>,
    next_steps: Vec<NextStep>,
    mut diagnostics: Vec<Diagnostic>,
) -> Timeline {
    drafts.sort_by(|a, b| {
        let (ba, bb) = (bucket(a, entry), bucket(b, entry));
        ba.cmp(&bb).then_with(|| match ba {
            1 => a.at.cmp(&b.at).then(a.declaration.cmp(&b.declaration)),
            2 => a
                .sequence
                .cmp(&b.sequence)
                .then(a.position.cmp(&b.position))
                .then(a.declaration.cmp(&b.declaration)),
            _ => a.declaration.cmp(&b.declaration),
        })
    });

    for draft in drafts.iter().filter(|draft| draft.from_record && draft.at.is_none()) {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::UnparsableTimestamp,
            match &draft.parse_error {
                Some(err) => format!("step '{}': {}; ordered last", draft.name, err),
                None => format!(
                    "timestamp '{}' of step '{}' could not be parsed; ordered last",
                    draft.raw.as_deref().unwrap_or_default(),
                    draft.name
                ),
            },
            Some(draft.key.to_string()),
        ));
    }

    let mut entries: Vec<TimelineEntry> = drafts
        .into_iter()
        .map(|draft| TimelineEntry {
            step_id: Some(draft.key.id),
            path: draft.key.path,
            step_name: draft.name,
            status: draft.status,
            timestamp: draft.at,
            raw_timestamp: draft.raw,
            user_id: draft.user_id,
            memo: draft.memo,
            order: 0,
            implicit: draft.implicit,
            candidates: Vec::new(),
        })
        .collect();

    match next_steps.as_slice() {
        [] => {}
        [only] => entries.push(TimelineEntry {
            step_id: Some(only.step_id),
            path: only.path.clone(),
            step_name: only.step_name.clone(),
            status: EntryStatus::Pending,
            timestamp: None,
            raw_timestamp: None,
            user_id: None,
            memo: None,
            order: 0,
            implicit: false,
            candidates: Vec::new(),
        }),
        many => entries.push(TimelineEntry {
            step_id: None,
            path: Vec::new(),
            step_name: many
                .iter()
                .map(|step| step.step_name.as_str())
                .collect::<Vec<_>>()
                .join(BRANCH_LABEL_SEPARATOR),
            status: EntryStatus::Branch,
            timestamp: None,
            raw_timestamp: None,
            user_id: None,
            memo: None,
            order: 0,
            implicit: false,
            candidates: many.to_vec(),
        }),
    }

    for (idx, entry) in entries.iter_mut().enumerate() {
        entry.order = idx + 1;
    }

    Timeline {
        document_id,
        mode,
        entries,
        next_steps,
        diagnostics,
    }
}
