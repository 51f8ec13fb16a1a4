//! Configuration management for ruleweb
//!
//! Loads and validates the YAML configuration: where the rules dataset
//! lives, how the rule list window grows, and the default log level.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::{ConfigError, ConfigResult};

// ==================== Configuration Types ====================

/// Data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the dataset
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
    /// Rules dataset file name (JSON)
    #[serde(default = "default_rules_file")]
    pub rules_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            rules_file: default_rules_file(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_rules_file() -> String {
    "rules.json".to_string()
}

/// Window sizes for the rule list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Rules shown right after the first load
    #[serde(default = "default_initial_window")]
    pub initial_window: usize,
    /// Rules appended by each "load more"
    #[serde(default = "default_load_more_step")]
    pub load_more_step: usize,
    /// Rules kept visible past a created or moved rule
    #[serde(default = "default_reveal_margin")]
    pub reveal_margin: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            initial_window: default_initial_window(),
            load_more_step: default_load_more_step(),
            reveal_margin: default_reveal_margin(),
        }
    }
}

fn default_initial_window() -> usize {
    100
}

fn default_load_more_step() -> usize {
    50
}

fn default_reveal_margin() -> usize {
    75
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub async fn load_async(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::IoError(e)
            }
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            message: e.to_string(),
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.pagination.initial_window == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.initial_window".to_string(),
                reason: "Initial window must be greater than 0".to_string(),
            });
        }

        if self.pagination.load_more_step == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.load_more_step".to_string(),
                reason: "Load more step must be greater than 0".to_string(),
            });
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Log level must be one of: {}", LOG_LEVELS.join(", ")),
            });
        }

        Ok(())
    }

    /// The default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Full path to the rules dataset
    pub fn rules_path(&self) -> PathBuf {
        self.data.path.join(&self.data.rules_file)
    }
}

// ==================== Tests ====================
