//! Plain-text renderings of engine output for the terminal.

use crate::core::service::ProgressReport;
use crate::core::workflow::lint::LintResult;
use crate::core::workflow::timeline::Timeline;
use docflow_types::{AssemblyMode, Authorization, StepId, TimelineEntry};
use serde::Serialize;
use std::fmt::Write as _;

pub fn describe_authorization(authorization: &Authorization) -> String {
    match authorization {
        Authorization::NoRule => "no rule".to_string(),
        Authorization::Unrestricted => "anyone".to_string(),
        Authorization::Restricted(users) => users.iter().cloned().collect::<Vec<_>>().join(", "),
    }
}

fn entry_line(entry: &TimelineEntry) -> String {
    let mut line = format!(
        "{:>3}. {:<9} {}",
        entry.order,
        entry.status.to_string(),
        entry.step_name
    );
    match (&entry.timestamp, &entry.raw_timestamp) {
        (Some(at), _) => {
            let _ = write!(line, " @ {}", at.format("%Y-%m-%d %H:%M UTC"));
        }
        (None, Some(raw)) => {
            let _ = write!(line, " @ {} (unparsed)", raw);
        }
        (None, None) => {}
    }
    if let Some(user) = &entry.user_id {
        let _ = write!(line, " by {}", user);
    }
    if entry.implicit {
        line.push_str(" (implicit)");
    }
    line
}

pub fn timeline_text(timeline: &Timeline) -> String {
    let mode = match timeline.mode {
        AssemblyMode::Workflow => "workflow",
        AssemblyMode::HistoryOnly => "history only",
    };
    let mut out = format!("Document {} ({})\n", timeline.document_id, mode);
    for entry in &timeline.entries {
        let _ = writeln!(out, "{}", entry_line(entry));
    }
    if timeline.next_steps.len() > 1 {
        out.push_str("\nNext step candidates:\n");
        for step in &timeline.next_steps {
            let _ = writeln!(
                out,
                "  - {} (#{}): {}",
                step.step_name,
                step.step_id,
                describe_authorization(&step.authorization)
            );
        }
    }
    if !timeline.diagnostics.is_empty() {
        out.push_str("\nDiagnostics:\n");
        for diagnostic in &timeline.diagnostics {
            let _ = writeln!(out, "  {}", diagnostic);
        }
    }
    out
}

pub fn progress_text(report: &ProgressReport) -> String {
    let summary = &report.summary;
    let mut out = format!(
        "Document {}: {} of {} steps completed ({:.1}%)\n",
        report.timeline.document_id,
        summary.completed_count,
        summary.total_known_steps,
        summary.percentage
    );
    let _ = writeln!(
        out,
        "Current: {}",
        summary.current_step_label.as_deref().unwrap_or("-")
    );
    if summary.branch_candidate_count > 0 {
        let _ = writeln!(
            out,
            "Pending: {} (branch of {} candidates)",
            summary.pending_count, summary.branch_candidate_count
        );
    } else {
        let _ = writeln!(out, "Pending: {}", summary.pending_count);
    }
    let _ = writeln!(out, "Finished: {}", if summary.finished { "yes" } else { "no" });
    out
}

/// One (from, to) pair of a catalog's transition rules, with the merged
/// authorization of every rule covering it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRow {
    pub from_step_id: StepId,
    pub from_name: String,
    pub to_step_id: StepId,
    pub to_name: String,
    pub authorization: Authorization,
    pub reassignment: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_allowed: Option<bool>,
}

pub fn transitions_text(rows: &[TransitionRow], user: Option<&str>) -> String {
    if rows.is_empty() {
        return "No transitions\n".to_string();
    }
    let mut out = String::new();
    for row in rows {
        let _ = write!(
            out,
            "{} (#{}) -> {} (#{}): {}",
            row.from_name,
            row.from_step_id,
            row.to_name,
            row.to_step_id,
            describe_authorization(&row.authorization)
        );
        if row.reassignment {
            out.push_str(" (reassignment)");
        }
        if let (Some(user), Some(allowed)) = (user, row.user_allowed) {
            let _ = write!(out, " [{}: {}]", user, if allowed { "allowed" } else { "denied" });
        }
        out.push('\n');
    }
    out
}

pub fn lint_text(results: &[LintResult]) -> String {
    if results.is_empty() {
        return "No issues found\n".to_string();
    }
    let mut out = String::new();
    for result in results {
        let _ = writeln!(out, "{}", result);
        if let Some(suggestion) = &result.suggestion {
            let _ = writeln!(out, "    hint: {}", suggestion);
        }
    }
    out
}
