use crate::errors::ConfigError;
use crate::reader::ReadOptions;
use crate::storage::SessionOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_FILENAME: &str = "junit.xml";
pub const DEFAULT_SUMMARY_TABLE: &str = "junit_suite_summary";
pub const DEFAULT_SUITE_PREFIX: &str = "junit_";
pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// One configuration layer. Every field is optional so layers can be
/// stacked: flags over environment over config file over defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConfigLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "filenames")]
    pub files: Option<Vec<PathBuf>>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "summary_tbl_name")]
    pub summary_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl ConfigLayer {
    /// Fields set in `self` win over `lower`.
    pub fn over(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            hostname: self.hostname.or(lower.hostname),
            port: self.port.or(lower.port),
            username: self.username.or(lower.username),
            password: self.password.or(lower.password),
            database: self.database.or(lower.database),
            data_dir: self.data_dir.or(lower.data_dir),
            files: self.files.or(lower.files),
            summary_table: self.summary_table.or(lower.summary_table),
            suite_prefix: self.suite_prefix.or(lower.suite_prefix),
            limit: self.limit.or(lower.limit),
            log_level: self.log_level.or(lower.log_level),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedLayer {
    pub layer: ConfigLayer,
    /// Keys present in the file but not understood.
    pub ignored_keys: Vec<String>,
}

/// Reads a YAML config file. Unknown keys are collected, not rejected.
pub fn load_config(path: &Path) -> Result<LoadedLayer, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;

    if raw.trim().is_empty() {
        return Ok(LoadedLayer {
            layer: ConfigLayer::default(),
            ignored_keys: Vec::new(),
        });
    }

    let mut ignored_keys = Vec::new();
    let deserializer = serde_yaml::Deserializer::from_str(&raw);
    let layer: ConfigLayer = serde_ignored::deserialize(deserializer, |path| {
        ignored_keys.push(path.to_string());
    })
    .map_err(|e| ConfigError(format!("failed to parse YAML {}: {}", path.display(), e)))?;

    Ok(LoadedLayer {
        layer,
        ignored_keys,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Ingest files into the ledger.
    Write,
    /// Read back one table; `summary` selects the summary table by name.
    Read { summary: bool },
}

/// Fully resolved run configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub session: SessionOptions,
    pub files: Vec<PathBuf>,
    pub summary_table: String,
    pub suite_prefix: String,
    /// Accepted for compatibility; read output is not truncated.
    pub limit: usize,
    pub log_level: String,
    pub mode: Mode,
}

impl LedgerConfig {
    pub fn from_layer(layer: ConfigLayer, mode: Mode) -> Result<Self, ConfigError> {
        let defaults = SessionOptions::default();
        let cfg = Self {
            session: SessionOptions {
                hostname: layer.hostname.unwrap_or(defaults.hostname),
                port: layer.port.unwrap_or(defaults.port),
                username: layer.username.unwrap_or(defaults.username),
                password: layer.password.unwrap_or(defaults.password),
                database: layer.database.unwrap_or(defaults.database),
                data_dir: layer.data_dir.unwrap_or(defaults.data_dir),
            },
            files: layer
                .files
                .unwrap_or_else(|| vec![PathBuf::from(DEFAULT_FILENAME)]),
            summary_table: layer
                .summary_table
                .unwrap_or_else(|| DEFAULT_SUMMARY_TABLE.to_string()),
            suite_prefix: layer
                .suite_prefix
                .unwrap_or_else(|| DEFAULT_SUITE_PREFIX.to_string()),
            limit: layer.limit.unwrap_or(DEFAULT_LIMIT),
            log_level: layer
                .log_level
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            mode,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.summary_table.trim().is_empty() {
            return Err(ConfigError("summary table name must not be empty".into()));
        }
        if self.mode == Mode::Write && self.files.is_empty() {
            return Err(ConfigError("no file provided".into()));
        }
        if let Some(empty) = self.files.iter().find(|f| f.as_os_str().is_empty()) {
            return Err(ConfigError(format!("empty file name in {:?}", empty)));
        }
        Ok(())
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            summary_table: self.summary_table.clone(),
            prefix: self.suite_prefix.clone(),
            summary: matches!(self.mode, Mode::Read { summary: true }),
        }
    }
}
