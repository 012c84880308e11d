//! YAML service configuration. Malformed configuration is fatal at startup.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use serde::Deserialize;
use thiserror::Error;

use crate::data::rules::{CleaningRules, DataType, FormatMode};
use crate::data::store::DatasetSource;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_KEY_COLUMN: &str = "Pincode";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("unknown text encoding '{0}'")]
    Encoding(String),
    #[error("invalid regex for column '{column}': {source}")]
    Pattern {
        column: String,
        #[source]
        source: regex::Error,
    },
    #[error("rule references column '{0}' which is not in the retained columns")]
    UnknownColumn(String),
    #[error("key column '{0}' must use the int datatype")]
    KeyNotInteger(String),
    #[error("unknown log level '{0}'")]
    LogLevel(String),
    #[error("logging.backups must be at least 1")]
    ZeroBackups,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub cleaning: CleaningConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    pub path: PathBuf,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default = "default_key_column")]
    pub key_column: String,
}

/// Raw cleaning rules as written in the config file. See [`CleaningRules`] for the
/// compiled form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleaningConfig {
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub datatypes: BTreeMap<String, DataType>,
    #[serde(default)]
    pub patterns: BTreeMap<String, String>,
    #[serde(default)]
    pub formats: BTreeMap<String, FormatMode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log to this file with time-based rotation; stderr when absent.
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub rotation: LogRotation,
    /// Log files kept on disk, the current one included.
    #[serde(default = "default_backups")]
    pub backups: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            rotation: LogRotation::default(),
            backups: default_backups(),
        }
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

fn default_key_column() -> String {
    DEFAULT_KEY_COLUMN.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backups() -> usize {
    3
}

impl AppConfig {
    /// Read and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&raw)?;
        if config.dataset.path.is_relative() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                config.dataset.path = parent.join(&config.dataset.path);
            }
        }
        Ok(config)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let mut config: AppConfig = serde_yaml::from_str(raw)?;
        if let Ok(bind) = env::var("PINCODE_BIND") {
            config.server.bind = bind;
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.dataset.encoding()?;
        self.cleaning_rules()?;
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::LogLevel(self.logging.level.clone()));
        }
        if self.logging.backups == 0 {
            return Err(ConfigError::ZeroBackups);
        }
        Ok(())
    }

    pub fn cleaning_rules(&self) -> Result<CleaningRules, ConfigError> {
        CleaningRules::compile(&self.cleaning, &self.dataset.key_column)
    }

    pub fn dataset_source(&self) -> Result<DatasetSource, ConfigError> {
        Ok(DatasetSource {
            path: self.dataset.path.clone(),
            encoding: self.dataset.encoding()?,
        })
    }
}

impl DatasetConfig {
    pub fn encoding(&self) -> Result<&'static Encoding, ConfigError> {
        Encoding::for_label(self.encoding.trim().as_bytes())
            .ok_or_else(|| ConfigError::Encoding(self.encoding.clone()))
    }
}

/// Config path from `--config <path>`, then `PINCODE_CONFIG`, then the default.
pub fn resolve_config_path(args: &[String]) -> PathBuf {
    args.iter()
        .position(|arg| arg == "--config")
        .and_then(|index| args.get(index + 1))
        .map(PathBuf::from)
        .or_else(|| env::var_os("PINCODE_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
