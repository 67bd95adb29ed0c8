use docflow::core::config::{ConfigLoader, ConfigValidator, DocflowConfig};
use docflow::core::workflow::TimestampParser;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

fn clear_docflow_env() {
    for v in &[
        "DOCFLOW_TIMELINE_SYNTHESIZE_ENTRY",
        "DOCFLOW_TIMELINE_ALLOW_ENTRY_REASSIGNMENT",
        "DOCFLOW_TIMESTAMPS_UTC_OFFSET_MINUTES",
    ] {
        env::remove_var(v);
    }
}

/// Test integration of config loading with environment variables
#[test]
#[serial]
fn test_config_loading_integration() {
    clear_docflow_env();
    let temp_dir = TempDir::new().unwrap();
    let workspace_path = temp_dir.path();

    let config_content = r#"
[timeline]
synthesize_entry = false
allow_entry_reassignment = true

[timestamps]
separators = ["at"]
date_formats = ["%m/%d/%Y"]
time_formats = ["%H:%M"]
utc_offset_minutes = 0
"#;
    fs::write(workspace_path.join("docflow.toml"), config_content).unwrap();

    let config = ConfigLoader::load_from_workspace(workspace_path).unwrap();
    assert!(!config.timeline.synthesize_entry);
    assert!(config.timeline.allow_entry_reassignment);
    assert_eq!(config.timestamps.separators, vec!["at"]);
    assert!(ConfigValidator::validate(&config).is_ok());

    let parser = TimestampParser::new(&config.timestamps).unwrap();
    let parsed = parser.parse("10/19/2026 at 14:32").unwrap();
    assert_eq!(parsed.to_rfc3339(), "2026-10-19T14:32:00+00:00");
}

#[test]
#[serial]
fn test_env_overrides_apply_to_explicit_file() {
    clear_docflow_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("custom.toml");
    fs::write(&path, "[timeline]\nsynthesize_entry = true\n").unwrap();

    env::set_var("DOCFLOW_TIMELINE_SYNTHESIZE_ENTRY", "false");
    env::set_var("DOCFLOW_TIMESTAMPS_UTC_OFFSET_MINUTES", "60");
    let config = ConfigLoader::load(&path).unwrap();
    clear_docflow_env();

    assert!(!config.timeline.synthesize_entry);
    assert_eq!(config.timestamps.utc_offset_minutes, 60);
}

#[test]
#[serial]
fn test_missing_file_yields_defaults() {
    clear_docflow_env();
    let temp_dir = TempDir::new().unwrap();
    let config = ConfigLoader::load(&temp_dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, DocflowConfig::default());
}

#[test]
#[serial]
fn test_env_offset_is_validated() {
    clear_docflow_env();
    let temp_dir = TempDir::new().unwrap();
    env::set_var("DOCFLOW_TIMESTAMPS_UTC_OFFSET_MINUTES", "2000");
    let config = ConfigLoader::load_from_workspace(temp_dir.path()).unwrap();
    clear_docflow_env();

    let err = ConfigValidator::validate(&config).unwrap_err();
    assert!(err.to_string().contains("utc_offset_minutes"));
}
