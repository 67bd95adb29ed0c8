use crate::core::workflow::timeline::Timeline;
use docflow_types::{EntryStatus, StepKey, WorkflowCatalog};
use serde::Serialize;

/// Summary counters derived from an assembled timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub completed_count: usize,
    /// Completed, current and pending positions; a branch counts once.
    pub total_known_steps: usize,
    pub current_step_label: Option<String>,
    /// Pending entries plus the branch entry, if any.
    pub pending_count: usize,
    pub branch_candidate_count: usize,
    pub catalog_step_count: usize,
    /// Completed share of the known steps, 0 to 100.
    pub percentage: f64,
    /// The document sits on a terminal step with nowhere left to go.
    pub finished: bool,
}

pub struct ProgressCalculator;

impl ProgressCalculator {
    pub fn summarize(timeline: &Timeline, catalog: Option<&WorkflowCatalog>) -> ProgressSummary {
        let completed_count = timeline.count(EntryStatus::Completed);
        let current = timeline.current();
        let pending = timeline.count(EntryStatus::Pending);
        let branches = timeline.count(EntryStatus::Branch);
        let pending_count = pending + branches;
        let total_known_steps = completed_count + usize::from(current.is_some()) + pending_count;

        let percentage = if total_known_steps == 0 {
            0.0
        } else {
            completed_count as f64 / total_known_steps as f64 * 100.0
        };

        let branch_candidate_count = timeline
            .entries
            .iter()
            .filter(|entry| entry.status == EntryStatus::Branch)
            .map(|entry| entry.candidates.len())
            .sum();

        let finished = match (current.and_then(|entry| entry.key()), catalog) {
            (Some(key), Some(catalog)) => timeline.is_terminal() && is_terminal_role(catalog, &key),
            _ => false,
        };

        ProgressSummary {
            completed_count,
            total_known_steps,
            current_step_label: current.map(|entry| entry.step_name.clone()),
            pending_count,
            branch_candidate_count,
            catalog_step_count: catalog.map(|c| c.steps.len()).unwrap_or(0),
            percentage,
            finished,
        }
    }
}

fn is_terminal_role(catalog: &WorkflowCatalog, key: &StepKey) -> bool {
    catalog
        .steps
        .iter()
        .find(|step| step.id == key.id && step.path == key.path)
        .map(|step| step.role.is_terminal())
        .unwrap_or(false)
}
