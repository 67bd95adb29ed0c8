use docflow::core::config::DocflowConfig;
use docflow::core::types::ErrorCategory;
use docflow::core::{
    FileCatalogSource, FileDocumentSource, FileHistorySource, NoCatalog, TimelineService,
};
use docflow::types::{AssemblyMode, Authorization, EntryStatus, StepId};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CATALOGS: &str = r#"[
  {
    "documentTypeId": 10,
    "steps": [
      {"id": 1, "name": "ENTRADA", "level": 0, "path": [1], "role": "entry"},
      {"id": 2, "name": "ANALISE", "level": 1, "parentId": 1, "path": [1, 2]},
      {"id": 3, "name": "APROVADO", "level": 2, "parentId": 2, "path": [1, 2, 3], "role": "successTerminal"},
      {"id": 4, "name": "REJEITADO", "level": 2, "parentId": 2, "path": [1, 2, 4], "role": "failureTerminal"}
    ],
    "transitions": [
      {"documentTypeId": 10, "fromStepId": 1, "toStepId": 2},
      {"documentTypeId": 10, "fromStepId": 1, "toStepId": 1},
      {"documentTypeId": 10, "fromStepId": 2, "toStepId": 2, "authorizedUsers": ["chefia"]},
      {"documentTypeId": 10, "fromStepId": 2, "toStepId": 3, "authorizedUsers": ["ana"]},
      {"documentTypeId": 10, "fromStepId": 2, "toStepId": 3, "authorizedUsers": ["bruno"]},
      {"documentTypeId": 10, "fromStepId": 2, "toStepId": 4}
    ]
  }
]"#;

const HISTORY: &str = r#"{
  "500": [
    {"stepReference": 1, "timestamp": "19/10/2026 às 09:00", "userId": "caio"},
    {"stepReference": "analise", "timestamp": "19/10/2026 às 10:15", "userId": "ana"}
  ],
  "501": [
    {"stepReference": 1, "timestamp": "20/10/2026 às 08:00", "userId": "caio"},
    {"stepReference": 2, "timestamp": "20/10/2026 às 09:00", "userId": "ana"},
    {"stepReference": 3, "timestamp": "20/10/2026 às 11:00", "userId": "ana"}
  ],
  "900": [
    {"stepReference": 40, "timestamp": "2026-10-19T10:00:00Z", "stepLabel": "Protocolo"}
  ]
}"#;

const DOCUMENTS: &str = r#"[
  {"id": 500, "typeId": 10, "currentStepId": 2, "createdAt": "2026-10-19T11:55:00Z"},
  {"id": 501, "typeId": 10, "currentStepId": 3, "createdAt": "2026-10-20T10:55:00Z"},
  {"id": 502, "typeId": 10, "currentStepId": 1, "createdAt": "2026-10-21T10:55:00Z"},
  {"id": 900, "typeId": 20, "currentStepId": 41, "createdAt": "2026-10-19T09:00:00Z", "currentStepLabel": "Despacho"}
]"#;

struct Fixture {
    _dir: TempDir,
    catalogs: FileCatalogSource,
    history: FileHistorySource,
    documents: FileDocumentSource,
}

fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let catalogs = FileCatalogSource::open(write(dir.path(), "catalogs.json", CATALOGS)).unwrap();
    let history = FileHistorySource::open(write(dir.path(), "history.json", HISTORY)).unwrap();
    let documents =
        FileDocumentSource::open(write(dir.path(), "documents.json", DOCUMENTS)).unwrap();
    Fixture {
        _dir: dir,
        catalogs,
        history,
        documents,
    }
}

fn service(
    fixture: Fixture,
    config: &DocflowConfig,
) -> TimelineService<FileCatalogSource, FileHistorySource, FileDocumentSource> {
    TimelineService::new(fixture.catalogs, fixture.history, fixture.documents, config).unwrap()
}

#[test]
fn timeline_merges_all_three_sources() {
    let service = service(fixture(), &DocflowConfig::default());
    let timeline = service.timeline(500).unwrap();

    assert_eq!(timeline.mode, AssemblyMode::Workflow);
    let statuses: Vec<EntryStatus> = timeline.entries.iter().map(|entry| entry.status).collect();
    assert_eq!(
        statuses,
        vec![EntryStatus::Completed, EntryStatus::Current, EntryStatus::Branch]
    );
    assert_eq!(timeline.entries[1].user_id.as_deref(), Some("ana"));
    assert_eq!(
        timeline.next_steps[0].authorization,
        Authorization::Restricted(["ana".to_string(), "bruno".to_string()].into_iter().collect())
    );
}

#[test]
fn progress_reports_a_finished_document() {
    let service = service(fixture(), &DocflowConfig::default());
    let report = service.progress(501).unwrap();

    assert_eq!(report.summary.completed_count, 2);
    assert_eq!(report.summary.current_step_label.as_deref(), Some("APROVADO"));
    assert_eq!(report.summary.pending_count, 0);
    assert_eq!(report.summary.catalog_step_count, 4);
    assert!(report.summary.finished);
}

#[test]
fn unknown_document_type_degrades_to_history_only() {
    let service = service(fixture(), &DocflowConfig::default());
    let timeline = service.timeline(900).unwrap();

    assert_eq!(timeline.mode, AssemblyMode::HistoryOnly);
    let names: Vec<&str> = timeline
        .entries
        .iter()
        .map(|entry| entry.step_name.as_str())
        .collect();
    assert_eq!(names, vec!["Protocolo", "Despacho"]);
}

#[test]
fn no_catalog_source_always_degrades() {
    let fixture = fixture();
    let service = TimelineService::new(
        NoCatalog,
        fixture.history,
        fixture.documents,
        &DocflowConfig::default(),
    )
    .unwrap();
    let timeline = service.timeline(501).unwrap();
    assert_eq!(timeline.mode, AssemblyMode::HistoryOnly);
    assert_eq!(timeline.current().map(|entry| entry.step_id), Some(Some(StepId(3))));
}

#[test]
fn missing_document_is_an_error() {
    let service = service(fixture(), &DocflowConfig::default());
    let err = service.timeline(12345).unwrap_err();
    assert_eq!(err.category, ErrorCategory::DocumentError);
    assert_eq!(err.code, "DOC-SRC-006");
}

#[test]
fn authorization_follows_the_current_step() {
    let service = service(fixture(), &DocflowConfig::default());
    assert_eq!(
        service.authorization_for(500, StepId(4)).unwrap(),
        Authorization::Unrestricted
    );
    assert_eq!(
        service.authorization_for(500, StepId(1)).unwrap(),
        Authorization::NoRule
    );
    assert_eq!(
        service.authorization_for(900, StepId(42)).unwrap(),
        Authorization::NoRule
    );
}

#[test]
fn reassignment_on_the_entry_step_needs_configuration() {
    let service = service(fixture(), &DocflowConfig::default());
    assert!(service.can_reassign(500).unwrap());
    assert!(!service.can_reassign(502).unwrap());
    assert!(!service.can_reassign(501).unwrap());

    let mut config = DocflowConfig::default();
    config.timeline.allow_entry_reassignment = true;
    let permissive = self::service(fixture(), &config);
    assert!(permissive.can_reassign(502).unwrap());
}

#[test]
fn staying_on_the_entry_step_follows_the_reassignment_setting() {
    let service = service(fixture(), &DocflowConfig::default());
    assert_eq!(
        service.authorization_for(502, StepId(1)).unwrap(),
        Authorization::NoRule
    );
    assert_eq!(
        service.authorization_for(502, StepId(2)).unwrap(),
        Authorization::Unrestricted
    );
    assert_eq!(
        service.authorization_for(500, StepId(2)).unwrap(),
        Authorization::Restricted(["chefia".to_string()].into_iter().collect())
    );

    let mut config = DocflowConfig::default();
    config.timeline.allow_entry_reassignment = true;
    let permissive = self::service(fixture(), &config);
    assert_eq!(
        permissive.authorization_for(502, StepId(1)).unwrap(),
        Authorization::Unrestricted
    );
}

#[test]
fn invalid_configuration_is_rejected_up_front() {
    let mut config = DocflowConfig::default();
    config.timestamps.utc_offset_minutes = 20 * 60;
    let fixture = fixture();
    let result = TimelineService::new(
        fixture.catalogs,
        fixture.history,
        fixture.documents,
        &config,
    );
    match result {
        Err(err) => assert_eq!(err.category, ErrorCategory::ValidationError),
        Ok(_) => panic!("offset outside ±14h must be rejected"),
    }
}
