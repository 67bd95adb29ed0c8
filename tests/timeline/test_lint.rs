use docflow::core::workflow::{CatalogLinter, LintSeverity};
use docflow::core::FileCatalogSource;
use insta::assert_snapshot;
use std::fs;
use tempfile::TempDir;

const BROKEN_CATALOG: &str = r#"
documentTypeId: 10
steps:
  - { id: 1, name: ENTRADA, level: 0, path: [1], role: entry }
  - { id: 2, name: ANALISE, level: 1, parentId: 1, path: [1, 2] }
  - { id: 2, name: ANALISE, level: 1, parentId: 1, path: [1, 2] }
  - { id: 5, name: PARECER, level: 2, parentId: 9, path: [1, 9, 5] }
  - { id: 6, name: Analise, level: 2, parentId: 2, path: [1, 2, 6], role: successTerminal }
transitions:
  - { documentTypeId: 10, fromStepId: 1, toStepId: 2 }
  - { documentTypeId: 10, fromStepId: 2, toStepId: 6, authorizedUsers: [ana] }
  - { documentTypeId: 10, fromStepId: 6, toStepId: 2 }
  - { documentTypeId: 10, fromStepId: 2, toStepId: 99 }
  - { documentTypeId: 11, fromStepId: 1, toStepId: 5 }
"#;

const CLEAN_CATALOG: &str = r#"
documentTypeId: 10
steps:
  - { id: 1, name: ENTRADA, level: 0, path: [1] }
  - { id: 2, name: ANALISE, level: 1, parentId: 1, path: [1, 2] }
  - { id: 3, name: APROVADO, level: 2, parentId: 2, path: [1, 2, 3], role: successTerminal }
  - { id: 4, name: REJEITADO, level: 2, parentId: 2, path: [1, 2, 4], role: failureTerminal }
transitions:
  - { documentTypeId: 10, fromStepId: 1, toStepId: 2 }
  - { documentTypeId: 10, fromStepId: 2, toStepId: 3, authorizedUsers: [ana] }
  - { documentTypeId: 10, fromStepId: 2, toStepId: 4 }
"#;

fn load(body: &str) -> docflow::types::WorkflowCatalog {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("catalog.yaml");
    fs::write(&path, body).expect("write catalog");
    let source = FileCatalogSource::open(&path).expect("open catalog");
    source.select(None).expect("single catalog").clone()
}

#[test]
fn clean_catalog_has_no_findings() {
    let results = CatalogLinter::new().run(&load(CLEAN_CATALOG));
    assert!(results.is_empty(), "unexpected findings: {:?}", results);
}

#[test]
fn findings_are_sorted_by_severity_code_and_location() {
    let results = CatalogLinter::new().run(&load(BROKEN_CATALOG));

    let summary: Vec<String> = results
        .iter()
        .map(|result| {
            format!(
                "{} {} {}",
                result.severity,
                result.code,
                result.location.as_deref().unwrap_or("-")
            )
        })
        .collect();
    assert_snapshot!(summary.join("\n"), @r###"
    Error DOC-LINT-001 2@[1/2]
    Error DOC-LINT-002 2->99
    Warning DOC-LINT-003 5@[1/9/5]
    Warning DOC-LINT-006 5
    Info DOC-LINT-007 type:11
    Info DOC-LINT-008 6
    Info DOC-LINT-009 analise
    "###);
}

#[test]
fn error_findings_carry_suggestions() {
    let results = CatalogLinter::new().run(&load(BROKEN_CATALOG));
    let errors: Vec<_> = results
        .iter()
        .filter(|result| result.severity == LintSeverity::Error)
        .collect();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|result| result.suggestion.is_some()));
    assert!(errors[1].message.contains("unknown target step 99"));
}

#[test]
fn missing_entry_step_is_reported() {
    let catalog = load(
        r#"
documentTypeId: 3
steps:
  - { id: 1, name: A, level: 0, path: [1] }
  - { id: 2, name: B, level: 0, path: [2] }
"#,
    );
    let results = CatalogLinter::new().run(&catalog);
    let codes: Vec<&str> = results.iter().map(|result| result.code.as_str()).collect();
    assert_eq!(codes, vec!["DOC-LINT-005"]);
}
