//! Compiler configuration
//!
//! Loaded from a JSON file; every key is optional.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::observability::Severity;

use super::errors::{ViewError, ViewResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Minimum log severity (`trace`, `info`, `warn`, `error`, `fatal`)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Drop dictionary fields before filtering paginated views
    #[serde(default = "default_true")]
    pub project_dicts_on_pagination: bool,

    /// Excluding label filters also drop documents left with no labels
    #[serde(default)]
    pub exclude_drops_empty: bool,

    /// Attach `_label_tags` counts to paginated views
    #[serde(default = "default_true")]
    pub count_label_tags: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            project_dicts_on_pagination: true,
            exclude_drops_empty: false,
            count_label_tags: true,
        }
    }
}

impl CompilerConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ViewResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ViewError::config(format!("Failed to read config: {}", e)))?;

        let config: CompilerConfig = serde_json::from_str(&content)
            .map_err(|e| ViewError::config(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ViewResult<()> {
        self.severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> ViewResult<Severity> {
        self.log_level.parse::<Severity>().map_err(ViewError::config)
    }
}
