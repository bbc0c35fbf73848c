//! Quick open configuration persistence
//!
//! Stores settings in `~/.config/outline-quick-open/config.yaml`

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::workspace::{GeneratedNameFilter, DEFAULT_EXCLUDE_PATTERN};

/// Settings that persist across runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickOpenConfig {
    /// A file whose outline makes no progress for this long is skipped (0 disables)
    #[serde(default = "default_file_timeout_ms")]
    pub file_timeout_ms: u64,

    /// Items per chunk delivered by the outline worker
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Regexes for generated file names that are never searched
    #[serde(default = "default_exclude_name_patterns")]
    pub exclude_name_patterns: Vec<String>,

    /// Rows printed by the CLI
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_file_timeout_ms() -> u64 {
    5000
}

fn default_chunk_size() -> usize {
    100
}

fn default_exclude_name_patterns() -> Vec<String> {
    vec![DEFAULT_EXCLUDE_PATTERN.to_string()]
}

fn default_max_results() -> usize {
    50
}

impl Default for QuickOpenConfig {
    fn default() -> Self {
        Self {
            file_timeout_ms: default_file_timeout_ms(),
            chunk_size: default_chunk_size(),
            exclude_name_patterns: default_exclude_name_patterns(),
            max_results: default_max_results(),
        }
    }
}

impl QuickOpenConfig {
    /// Load config from the config directory, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load config from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to the config directory
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;
        self.save_to(&path)
    }

    /// Save config to a specific file
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn file_timeout(&self) -> Option<Duration> {
        (self.file_timeout_ms > 0).then(|| Duration::from_millis(self.file_timeout_ms))
    }

    pub fn name_filter(&self) -> GeneratedNameFilter {
        GeneratedNameFilter::from_patterns(&self.exclude_name_patterns)
    }
}
