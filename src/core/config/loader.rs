#![allow(clippy::result_large_err)]

use super::DocflowConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::env;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from workspace root (workspace/docflow.toml)
    /// Environment variables override config file values
    pub fn load_from_workspace(workspace_path: &Path) -> Result<DocflowConfig, AppError> {
        let config_path = workspace_path.join("docflow.toml");
        Self::load(&config_path)
    }

    /// Load config from a specific file, falling back to defaults when it is absent,
    /// then apply environment overrides
    pub fn load(config_path: &Path) -> Result<DocflowConfig, AppError> {
        let mut config = Self::load_from_file(config_path)?.unwrap_or_default();
        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Load config from specific file path
    /// Returns Ok(None) if file doesn't exist
    pub fn load_from_file(path: &Path) -> Result<Option<DocflowConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
        })?;

        let config: DocflowConfig = toml::from_str(&content).map_err(|e| {
            AppError::new(
                ErrorCategory::ValidationError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
        })?;

        Ok(Some(config))
    }

    /// Apply environment variable overrides to the configuration
    /// Environment variables take precedence over config file values
    fn apply_env_overrides(config: &mut DocflowConfig) {
        if let Ok(value) = env::var("DOCFLOW_TIMELINE_SYNTHESIZE_ENTRY") {
            if let Ok(flag) = value.trim().parse::<bool>() {
                config.timeline.synthesize_entry = flag;
            }
        }

        if let Ok(value) = env::var("DOCFLOW_TIMELINE_ALLOW_ENTRY_REASSIGNMENT") {
            if let Ok(flag) = value.trim().parse::<bool>() {
                config.timeline.allow_entry_reassignment = flag;
            }
        }

        if let Ok(value) = env::var("DOCFLOW_TIMESTAMPS_UTC_OFFSET_MINUTES") {
            if let Ok(offset) = value.trim().parse::<i32>() {
                config.timestamps.utc_offset_minutes = offset;
            }
        }
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "DOCFLOW_TIMELINE_SYNTHESIZE_ENTRY - Add an implicit entry step when unlogged (true/false, default: true)",
            "DOCFLOW_TIMELINE_ALLOW_ENTRY_REASSIGNMENT - Allow reassignment on the entry step (true/false, default: false)",
            "DOCFLOW_TIMESTAMPS_UTC_OFFSET_MINUTES - Offset of history timestamps in minutes (default: -180)",
        ]
    }
}
