//! Restore invoker: hand a stored backup to the external restore tool.

use crate::process::CommandSpec;
use crate::store::{validate_segment, BackupStore};
use crate::utils::errors::{BackupError, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Which tables to restore from a backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSelector {
    All,
    Table(String),
}

impl fmt::Display for TableSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSelector::All => f.write_str("all"),
            TableSelector::Table(t) => f.write_str(t),
        }
    }
}

impl FromStr for TableSelector {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "all" {
            return Ok(TableSelector::All);
        }
        let valid = !s.is_empty()
            && s.len() <= 64
            && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if valid {
            Ok(TableSelector::Table(s.to_string()))
        } else {
            Err(BackupError::InvalidTable(s.to_string()))
        }
    }
}

impl Serialize for TableSelector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Loads a backup directory back into the application.
pub trait RestoreRunner: Send + Sync {
    /// `source` is a local directory holding the backup's files.
    fn run(&self, source: &Path, table: &TableSelector) -> Result<String>;
}

/// Restore tool called as `<command> --path=<dir> --table=<selector>`.
pub struct CommandRestoreRunner {
    command: CommandSpec,
}

impl CommandRestoreRunner {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }
}

impl RestoreRunner for CommandRestoreRunner {
    fn run(&self, source: &Path, table: &TableSelector) -> Result<String> {
        self.command.run(&[
            format!("--path={}", source.display()),
            format!("--table={}", table),
        ])
    }
}

#[derive(Debug, Serialize)]
pub struct RestoreOutcome {
    pub name: String,
    pub table: TableSelector,
    pub output: String,
}

pub struct Restorer {
    store: Arc<dyn BackupStore>,
    runner: Arc<dyn RestoreRunner>,
    staging_dir: PathBuf,
}

impl Restorer {
    pub fn new(
        store: Arc<dyn BackupStore>,
        runner: Arc<dyn RestoreRunner>,
        staging_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            runner,
            staging_dir: staging_dir.into(),
        }
    }

    /// Copy the backup into a scratch directory and run the restore tool on it.
    /// The scratch directory is removed however the run ends.
    pub fn restore(&self, name: &str, table: &TableSelector) -> Result<RestoreOutcome> {
        validate_segment(name)?;
        let files = self.store.list_files(name)?;

        std::fs::create_dir_all(&self.staging_dir)?;
        let stage = tempfile::Builder::new()
            .prefix("restore-")
            .tempdir_in(&self.staging_dir)?;

        for file in &files {
            let dest = stage.path().join(file);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&dest, self.store.read_file(name, file)?)?;
        }

        let output = self.runner.run(stage.path(), table)?;
        info!(backup = %name, table = %table, files = files.len(), "Backup restored");

        Ok(RestoreOutcome {
            name: name.to_string(),
            table: table.clone(),
            output,
        })
    }
}
