use chrono::{TimeZone, Utc};
use docflow::core::config::DocflowConfig;
use docflow::core::workflow::{
    DiagnosticKind, ProgressCalculator, TimelineAssembler, TimelineInputs,
};
use docflow::types::{
    AssemblyMode, Authorization, Document, EntryStatus, ExecutionRecord, StepDefinition, StepId,
    StepReference, StepRole, TransitionRule, WorkflowCatalog,
};

const DOC_TYPE: u64 = 10;

fn step(id: u64, name: &str, parent: Option<u64>, path: &[u64]) -> StepDefinition {
    StepDefinition {
        id: StepId(id),
        name: name.to_string(),
        level: path.len().saturating_sub(1) as u32,
        parent_id: parent.map(StepId),
        path: path.iter().copied().map(StepId).collect(),
        authorized_users: Vec::new(),
        memo: None,
        role: StepRole::Intermediate,
    }
}

fn rule(from: u64, to: u64, users: &[&str]) -> TransitionRule {
    TransitionRule {
        document_type_id: DOC_TYPE,
        from_step_id: StepId(from),
        to_step_id: StepId(to),
        authorized_users: users.iter().map(|u| u.to_string()).collect(),
    }
}

fn catalog(transitions: Vec<TransitionRule>) -> WorkflowCatalog {
    WorkflowCatalog {
        document_type_id: DOC_TYPE,
        steps: vec![
            step(1, "ENTRADA", None, &[1]),
            step(2, "ANALISE", Some(1), &[1, 2]),
            step(3, "APROVADO", Some(2), &[1, 2, 3]),
            step(4, "REJEITADO", Some(2), &[1, 2, 4]),
        ],
        transitions,
    }
}

fn review_rules() -> Vec<TransitionRule> {
    vec![rule(1, 2, &[]), rule(2, 3, &["ana"]), rule(2, 4, &[])]
}

fn record(reference: StepReference, timestamp: &str, user: &str) -> ExecutionRecord {
    ExecutionRecord {
        step_reference: reference,
        timestamp: timestamp.to_string(),
        user_id: Some(user.to_string()),
        memo: None,
        sequence_ordinal: None,
        step_label: None,
    }
}

fn document(current: u64) -> Document {
    Document {
        id: 500,
        type_id: DOC_TYPE,
        current_step_id: Some(StepId(current)),
        created_at: Utc.with_ymd_and_hms(2026, 10, 19, 11, 0, 0).unwrap(),
        current_step_label: None,
    }
}

fn assembler() -> TimelineAssembler {
    TimelineAssembler::from_config(&DocflowConfig::default()).unwrap()
}

#[test]
fn entry_completed_then_current_then_branch() {
    let catalog = catalog(review_rules());
    let history = vec![record(StepReference::Id(StepId(1)), "19/10/2026 às 09:00", "caio")];
    let document = document(2);

    let timeline = assembler().assemble(TimelineInputs {
        document: &document,
        history: &history,
        catalog: Some(&catalog),
    });

    assert_eq!(timeline.mode, AssemblyMode::Workflow);
    assert_eq!(timeline.entries.len(), 3);

    let entrada = &timeline.entries[0];
    assert_eq!(entrada.step_name, "ENTRADA");
    assert_eq!(entrada.status, EntryStatus::Completed);
    assert_eq!(
        entrada.timestamp,
        Some(Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap())
    );
    assert_eq!(entrada.user_id.as_deref(), Some("caio"));
    assert!(!entrada.implicit);

    let analise = &timeline.entries[1];
    assert_eq!(analise.step_name, "ANALISE");
    assert_eq!(analise.status, EntryStatus::Current);
    assert_eq!(analise.path, vec![StepId(1), StepId(2)]);

    let branch = &timeline.entries[2];
    assert_eq!(branch.status, EntryStatus::Branch);
    assert_eq!(branch.step_id, None);
    assert_eq!(branch.step_name, "APROVADO / REJEITADO");
    assert_eq!(branch.candidates.len(), 2);
    assert_eq!(
        branch.candidates[0].authorization,
        Authorization::Restricted(["ana".to_string()].into_iter().collect())
    );
    assert_eq!(branch.candidates[1].authorization, Authorization::Unrestricted);

    let orders: Vec<usize> = timeline.entries.iter().map(|entry| entry.order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
    assert!(timeline.diagnostics.is_empty());
}

#[test]
fn latest_record_per_step_wins() {
    let catalog = catalog(review_rules());
    let history = vec![
        record(StepReference::Id(StepId(2)), "2026-10-19T15:00:00Z", "bruno"),
        record(StepReference::Id(StepId(2)), "2026-10-19T13:00:00Z", "ana"),
    ];
    let document = document(2);

    let timeline = assembler().assemble(TimelineInputs {
        document: &document,
        history: &history,
        catalog: Some(&catalog),
    });

    let analise: Vec<_> = timeline
        .entries
        .iter()
        .filter(|entry| entry.step_id == Some(StepId(2)))
        .collect();
    assert_eq!(analise.len(), 1);
    assert_eq!(analise[0].user_id.as_deref(), Some("bruno"));
    assert_eq!(
        analise[0].timestamp,
        Some(Utc.with_ymd_and_hms(2026, 10, 19, 15, 0, 0).unwrap())
    );
    assert_eq!(analise[0].status, EntryStatus::Current);

    // The entry step was never logged, so it is synthesized from the creation time.
    let entrada = &timeline.entries[0];
    assert_eq!(entrada.step_id, Some(StepId(1)));
    assert!(entrada.implicit);
    assert_eq!(entrada.timestamp, Some(document.created_at));
}

#[test]
fn lowercase_name_reference_is_matched() {
    let catalog = catalog(review_rules());
    let history = vec![
        record(StepReference::Id(StepId(1)), "2026-10-19T12:00:00Z", "caio"),
        record(
            StepReference::Text("analise".to_string()),
            "2026-10-19T13:30:00Z",
            "ana",
        ),
    ];
    let document = document(2);

    let timeline = assembler().assemble(TimelineInputs {
        document: &document,
        history: &history,
        catalog: Some(&catalog),
    });

    let analise = timeline
        .entries
        .iter()
        .find(|entry| entry.step_id == Some(StepId(2)))
        .expect("ANALISE entry");
    assert_eq!(analise.step_name, "ANALISE");
    assert_eq!(analise.user_id.as_deref(), Some("ana"));
    assert!(analise.timestamp.is_some());
    assert!(timeline
        .diagnostics
        .iter()
        .all(|diagnostic| diagnostic.kind != DiagnosticKind::UnresolvedStepReference));
}

#[test]
fn no_rules_leaves_a_terminal_timeline() {
    let catalog = catalog(Vec::new());
    let history = vec![record(StepReference::Id(StepId(1)), "2026-10-19T12:00:00Z", "caio")];
    let document = document(2);

    let timeline = assembler().assemble(TimelineInputs {
        document: &document,
        history: &history,
        catalog: Some(&catalog),
    });

    let statuses: Vec<EntryStatus> = timeline.entries.iter().map(|entry| entry.status).collect();
    assert_eq!(statuses, vec![EntryStatus::Completed, EntryStatus::Current]);
    assert!(timeline.is_terminal());
    assert!(timeline
        .diagnostics
        .iter()
        .any(|diagnostic| diagnostic.kind == DiagnosticKind::NoValidTransition));

    let summary = ProgressCalculator::summarize(&timeline, Some(&catalog));
    assert_eq!(summary.completed_count, 1);
    assert_eq!(summary.total_known_steps, 2);
    assert_eq!(summary.pending_count, 0);
    assert!((summary.percentage - 50.0).abs() < f64::EPSILON);
    assert!(!summary.finished);
}
