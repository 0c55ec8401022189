//! History configuration
//!
//! Loaded from a JSON file. Every field is optional and falls back to its
//! default; unknown log levels are rejected.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::history::{HistoryError, HistoryResult};
use crate::observability::{Event, Logger, Severity};

/// Settings for the resolver and the in-memory resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maintain and consult the node-to-revisions index (default: true)
    #[serde(default = "default_true")]
    pub revision_index_enabled: bool,

    /// Index-instance selector of the node-to-revisions index (default: 0)
    #[serde(default)]
    pub revision_index_slot: u32,

    /// Maintain the value index over text and attribute values (default: true)
    #[serde(default = "default_true")]
    pub value_index_enabled: bool,

    /// Lowest log severity written (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            revision_index_enabled: true,
            revision_index_slot: 0,
            value_index_enabled: true,
            log_level: default_log_level(),
        }
    }
}

impl HistoryConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> HistoryResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| HistoryError::config(format!("failed to read config: {}", e)))?;

        let config = Self::from_json(&content)?;

        let path_str = path.display().to_string();
        Event::ConfigLoaded.log(&[
            ("log_level", config.log_level.as_str()),
            ("path", path_str.as_str()),
            (
                "revision_index",
                if config.revision_index_enabled { "enabled" } else { "disabled" },
            ),
        ]);

        Ok(config)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> HistoryResult<Self> {
        let config: HistoryConfig = serde_json::from_str(content)
            .map_err(|e| HistoryError::config(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check field values
    pub fn validate(&self) -> HistoryResult<()> {
        if Severity::parse(&self.log_level).is_none() {
            return Err(HistoryError::config(format!(
                "invalid log_level: '{}'. Expected trace, info, warn, error or fatal.",
                self.log_level
            )));
        }
        Ok(())
    }

    /// Returns the parsed log level
    pub fn severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Info)
    }

    /// Applies the log level to the process-wide logger
    pub fn apply_logging(&self) {
        Logger::set_min_severity(self.severity());
    }
}
