//! Backup producer: run the data exporter for a category and store the result
//! as one new timestamped backup.

use crate::name::BackupName;
use crate::process::CommandSpec;
use crate::store::{validate_relative_path, BackupStore};
use crate::summary::{BackupSummary, SUMMARY_FILE};
use crate::utils::errors::{BackupError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Named subset of application data that can be backed up on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    All,
    Users,
    Companies,
    Jobs,
    JobInteractions,
    SecurityLogs,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::All,
        Category::Users,
        Category::Companies,
        Category::Jobs,
        Category::JobInteractions,
        Category::SecurityLogs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::All => "all",
            Category::Users => "users",
            Category::Companies => "companies",
            Category::Jobs => "jobs",
            Category::JobInteractions => "job_interactions",
            Category::SecurityLogs => "security_logs",
        }
    }

    /// Exporter targets, in run order. `jobs` also takes the companies and
    /// interactions it depends on.
    pub fn export_targets(&self) -> &'static [&'static str] {
        match self {
            Category::All => &["all"],
            Category::Users => &["users"],
            Category::Companies => &["companies"],
            Category::Jobs => &["companies", "jobs", "job_interactions"],
            Category::JobInteractions => &["job_interactions"],
            Category::SecurityLogs => &["security_logs"],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| BackupError::InvalidCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(BackupError::InvalidFormat(other.to_string())),
        }
    }
}

/// One file produced by an export, addressed relative to the backup directory.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub path: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct ExportOutput {
    pub files: Vec<ExportedFile>,
    pub log: String,
}

/// Runs the data exporter for a single target.
pub trait ExportRunner: Send + Sync {
    fn run(&self, target: &str, format: ExportFormat) -> Result<ExportOutput>;
}

/// Exporter backed by an external command. The command is called with
/// `--table=<target> --format=<format> --output=<dir>` and must write its files into `dir`.
pub struct CommandExportRunner {
    command: CommandSpec,
    staging_dir: PathBuf,
}

impl CommandExportRunner {
    pub fn new(command: CommandSpec, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            command,
            staging_dir: staging_dir.into(),
        }
    }
}

impl ExportRunner for CommandExportRunner {
    fn run(&self, target: &str, format: ExportFormat) -> Result<ExportOutput> {
        std::fs::create_dir_all(&self.staging_dir)?;
        let out_dir = tempfile::Builder::new()
            .prefix("export-")
            .tempdir_in(&self.staging_dir)?;

        let log = self.command.run(&[
            format!("--table={}", target),
            format!("--format={}", format),
            format!("--output={}", out_dir.path().display()),
        ])?;

        let mut files = Vec::new();
        for entry in WalkDir::new(out_dir.path()).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                BackupError::Storage(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "export walk failed")
                }))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(out_dir.path()).unwrap_or(entry.path());
            let path: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect();
            files.push(ExportedFile {
                path: path.join("/"),
                data: std::fs::read(entry.path())?,
            });
        }

        Ok(ExportOutput { files, log })
    }
}

#[derive(Debug, Serialize)]
pub struct ProduceOutcome {
    pub name: BackupName,
    pub category: Category,
    pub format: ExportFormat,
    pub tables: Vec<String>,
    pub files: usize,
    pub total_size_bytes: u64,
    pub output: String,
}

pub struct BackupProducer {
    store: Arc<dyn BackupStore>,
    runner: Arc<dyn ExportRunner>,
}

impl BackupProducer {
    pub fn new(store: Arc<dyn BackupStore>, runner: Arc<dyn ExportRunner>) -> Self {
        Self { store, runner }
    }

    /// Export `category` into a new backup named after the current time.
    pub fn create(&self, category: Category, format: ExportFormat) -> Result<ProduceOutcome> {
        self.create_named(BackupName::now(), category, format)
    }

    /// Export into a backup with an explicit name. The directory is created
    /// once, every export target writes into it, and it is removed again if
    /// any target fails.
    pub fn create_named(
        &self,
        name: BackupName,
        category: Category,
        format: ExportFormat,
    ) -> Result<ProduceOutcome> {
        self.store.create_dir(name.as_str())?;

        match self.fill(&name, category, format) {
            Ok(outcome) => {
                info!(
                    backup = %name,
                    category = %category,
                    files = outcome.files,
                    bytes = outcome.total_size_bytes,
                    "Backup created"
                );
                Ok(outcome)
            }
            Err(e) => {
                warn!(backup = %name, category = %category, error = %e, "Backup failed, removing partial directory");
                if let Err(cleanup) = self.store.delete_dir(name.as_str()) {
                    warn!(backup = %name, error = %cleanup, "Failed to remove partial backup");
                }
                Err(e)
            }
        }
    }

    fn fill(&self, name: &BackupName, category: Category, format: ExportFormat) -> Result<ProduceOutcome> {
        let dir = name.as_str();
        let mut log = String::new();
        let mut files = 0usize;
        let mut total_size_bytes = 0u64;
        let mut has_summary = false;

        for target in category.export_targets() {
            let output = self.runner.run(target, format)?;
            log.push_str(&output.log);

            for file in output.files {
                validate_relative_path(&file.path)?;
                self.store.write_file(dir, &file.path, &file.data)?;
                if file.path == SUMMARY_FILE {
                    has_summary = true;
                } else {
                    files += 1;
                    total_size_bytes += file.data.len() as u64;
                }
            }
        }

        let tables: Vec<String> = category.export_targets().iter().map(|t| t.to_string()).collect();

        if !has_summary {
            let summary = BackupSummary {
                created_at: Some(name.timestamp()),
                category: Some(category.to_string()),
                format: Some(format.to_string()),
                tables: tables.clone(),
                total_files: Some(files),
                total_bytes: Some(total_size_bytes),
                ..Default::default()
            };
            self.store.write_file(dir, SUMMARY_FILE, &summary.to_vec()?)?;
        }

        Ok(ProduceOutcome {
            name: name.clone(),
            category,
            format,
            tables,
            files,
            total_size_bytes,
            output: log,
        })
    }
}
