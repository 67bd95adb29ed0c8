use serde::{Deserialize, Serialize};

/// Main docflow configuration loaded from docflow.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DocflowConfig {
    /// Timeline assembly configuration
    #[serde(default)]
    pub timeline: TimelineSettings,

    /// Timestamp parsing configuration
    #[serde(default)]
    pub timestamps: TimestampSettings,
}

/// Timeline assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineSettings {
    /// Add an implicit completed entry step when history never logged it
    #[serde(default = "default_synthesize_entry")]
    pub synthesize_entry: bool,

    /// Permit reassigning a document while it sits on the entry step
    #[serde(default)]
    pub allow_entry_reassignment: bool,
}

/// Timestamp parsing configuration for "date at time" history values
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimestampSettings {
    /// Words or punctuation separating the date from the time
    #[serde(default = "default_separators")]
    pub separators: Vec<String>,

    /// chrono formats tried for the date part
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,

    /// chrono formats tried for the time part
    #[serde(default = "default_time_formats")]
    pub time_formats: Vec<String>,

    /// Offset of the locale the history was written in
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

fn default_synthesize_entry() -> bool {
    true
}

fn default_separators() -> Vec<String> {
    vec!["às".into(), "as".into(), "at".into(), ",".into()]
}

fn default_date_formats() -> Vec<String> {
    vec!["%d/%m/%Y".into(), "%Y-%m-%d".into()]
}

fn default_time_formats() -> Vec<String> {
    vec!["%H:%M:%S".into(), "%H:%M".into()]
}

fn default_utc_offset_minutes() -> i32 {
    -180
}

impl Default for TimelineSettings {
    fn default() -> Self {
        TimelineSettings {
            synthesize_entry: default_synthesize_entry(),
            allow_entry_reassignment: false,
        }
    }
}

impl Default for TimestampSettings {
    fn default() -> Self {
        TimestampSettings {
            separators: default_separators(),
            date_formats: default_date_formats(),
            time_formats: default_time_formats(),
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}


pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;
pub use validation::ConfigValidator;
