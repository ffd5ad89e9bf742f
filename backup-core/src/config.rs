//! Configuration for backup storage, the external tools and retention.
//!
//! Loads from a TOML file with environment variable overrides.

use crate::process::CommandSpec;
use crate::producer::ExportFormat;
use crate::retention::DEFAULT_RETENTION_DAYS;
use crate::utils::errors::{BackupError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub restore: RestoreConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage area; backups live in its `backups/` subdirectory
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,

    /// Scratch space for archives and restores (default: system temp dir)
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_php")]
    pub program: PathBuf,

    #[serde(default = "default_export_args")]
    pub args: Vec<String>,

    #[serde(default)]
    pub default_format: ExportFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreConfig {
    #[serde(default = "default_php")]
    pub program: PathBuf,

    #[serde(default = "default_restore_args")]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Run the sweep on a schedule
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Backups older than this many days are removed
    #[serde(default = "default_retention_days")]
    pub days: u32,

    /// Six-field cron expression (sec min hour day month weekday)
    #[serde(default = "default_retention_cron")]
    pub cron: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_storage_root() -> PathBuf {
    PathBuf::from("storage/app")
}

fn default_php() -> PathBuf {
    PathBuf::from("php")
}

fn default_export_args() -> Vec<String> {
    vec!["artisan".to_string(), "data:export".to_string()]
}

fn default_restore_args() -> Vec<String> {
    vec!["artisan".to_string(), "data:restore".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

fn default_retention_cron() -> String {
    "0 0 3 * * *".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            staging_dir: None,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            program: default_php(),
            args: default_export_args(),
            default_format: ExportFormat::default(),
        }
    }
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self {
            program: default_php(),
            args: default_restore_args(),
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            days: default_retention_days(),
            cron: default_retention_cron(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ExportConfig {
    pub fn command(&self) -> CommandSpec {
        CommandSpec::new(self.program.clone(), self.args.clone())
    }
}

impl RestoreConfig {
    pub fn command(&self) -> CommandSpec {
        CommandSpec::new(self.program.clone(), self.args.clone())
    }
}

impl StorageConfig {
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| BackupError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Apply `STORAGE_ROOT`, `STAGING_DIR`, `EXPORT_PROGRAM`, `RESTORE_PROGRAM`,
    /// `RETENTION_DAYS` and `LOG_LEVEL` when set.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(root) = std::env::var("STORAGE_ROOT") {
            self.storage.root = PathBuf::from(root);
        }
        if let Ok(dir) = std::env::var("STAGING_DIR") {
            self.storage.staging_dir = Some(PathBuf::from(dir));
        }
        if let Ok(program) = std::env::var("EXPORT_PROGRAM") {
            self.export.program = PathBuf::from(program);
        }
        if let Ok(program) = std::env::var("RESTORE_PROGRAM") {
            self.restore.program = PathBuf::from(program);
        }
        if let Ok(days) = std::env::var("RETENTION_DAYS") {
            self.retention.days = days
                .parse()
                .map_err(|_| BackupError::Config(format!("RETENTION_DAYS must be a number, got '{}'", days)))?;
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.log.level = level;
        }
        Ok(())
    }
}
