#![allow(clippy::result_large_err)]

use super::DocflowConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use chrono::format::{Item, StrftimeItems};

const MAX_OFFSET_MINUTES: u32 = 14 * 60;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration rules
    pub fn validate(config: &DocflowConfig) -> Result<(), AppError> {
        let timestamps = &config.timestamps;

        if timestamps.date_formats.is_empty() {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                "timestamps.date_formats cannot be empty",
            ));
        }

        if timestamps.time_formats.is_empty() {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                "timestamps.time_formats cannot be empty",
            ));
        }

        if timestamps.utc_offset_minutes.unsigned_abs() > MAX_OFFSET_MINUTES {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                format!(
                    "timestamps.utc_offset_minutes must be within ±{}, got {}",
                    MAX_OFFSET_MINUTES, timestamps.utc_offset_minutes
                ),
            ));
        }

        for format in timestamps.date_formats.iter().chain(&timestamps.time_formats) {
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(AppError::new(
                    ErrorCategory::ValidationError,
                    format!("invalid chrono format string '{}'", format),
                ));
            }
        }

        if timestamps.separators.iter().any(|s| s.trim().is_empty()) {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                "timestamps.separators cannot contain blank entries",
            ));
        }

        Ok(())
    }
}
