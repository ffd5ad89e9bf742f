//! Backup catalog: enumerate, size and sort the backups in a store.
//!
//! Directories whose names are not valid timestamps are skipped with a
//! warning instead of failing the whole listing.

use crate::name::BackupName;
use crate::store::{validate_relative_path, validate_segment, BackupStore};
use crate::summary::{BackupSummary, SUMMARY_FILE};
use crate::utils::errors::Result;
use crate::utils::format::format_bytes;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Number of backups the dashboard widget shows by default
pub const DEFAULT_RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct BackupFile {
    pub path: String,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Backup {
    pub name: BackupName,
    pub created_at: NaiveDateTime,
    pub files: Vec<BackupFile>,
    pub total_size_bytes: u64,
    pub total_size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<BackupSummary>,
}

impl Backup {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// A directory left out of a listing or sweep, and why.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedEntry {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct Listing {
    /// Newest first
    pub backups: Vec<Backup>,
    pub skipped: Vec<SkippedEntry>,
}

#[derive(Debug, Default, Serialize)]
pub struct CatalogStats {
    pub count: usize,
    pub total_size_bytes: u64,
    pub total_size: String,
    pub oldest: Option<String>,
    pub newest: Option<String>,
}

impl CatalogStats {
    /// Count, total size and oldest/newest names in a single pass.
    pub fn from_backups(backups: &[Backup]) -> Self {
        let mut stats = CatalogStats::default();

        for backup in backups {
            let name = backup.name.as_str();
            stats.count += 1;
            stats.total_size_bytes += backup.total_size_bytes;
            if stats.oldest.as_deref().map_or(true, |o| name < o) {
                stats.oldest = Some(name.to_string());
            }
            if stats.newest.as_deref().map_or(true, |n| name > n) {
                stats.newest = Some(name.to_string());
            }
        }

        stats.total_size = format_bytes(stats.total_size_bytes);
        stats
    }
}

pub struct BackupCatalog {
    store: Arc<dyn BackupStore>,
}

impl BackupCatalog {
    pub fn new(store: Arc<dyn BackupStore>) -> Self {
        Self { store }
    }

    /// Every valid backup, newest first.
    pub fn list(&self) -> Result<Listing> {
        let mut listing = Listing::default();

        for dir in self.store.list_backup_dirs()? {
            let name = match BackupName::parse(&dir) {
                Ok(name) => name,
                Err(e) => {
                    warn!(dir = %dir, error = %e, "Skipping directory that is not a backup");
                    listing.skipped.push(SkippedEntry { name: dir, reason: e.to_string() });
                    continue;
                }
            };

            match self.load(name) {
                Ok(backup) => listing.backups.push(backup),
                Err(e) => {
                    warn!(dir = %dir, error = %e, "Skipping unreadable backup");
                    listing.skipped.push(SkippedEntry { name: dir, reason: e.to_string() });
                }
            }
        }

        listing
            .backups
            .sort_by(|a, b| b.name.as_str().cmp(a.name.as_str()));
        Ok(listing)
    }

    /// The `limit` newest backups.
    pub fn recent(&self, limit: usize) -> Result<Listing> {
        let mut listing = self.list()?;
        listing.backups.truncate(limit);
        Ok(listing)
    }

    pub fn stats(&self) -> Result<CatalogStats> {
        Ok(CatalogStats::from_backups(&self.list()?.backups))
    }

    /// One backup by name, with its files and summary.
    pub fn get(&self, name: &str) -> Result<Backup> {
        let name = BackupName::parse(name)?;
        self.load(name)
    }

    pub fn read_file(&self, name: &str, file: &str) -> Result<Vec<u8>> {
        validate_segment(name)?;
        validate_relative_path(file)?;
        self.store.read_file(name, file)
    }

    /// Delete one backup directory. Missing names report `NotFound`.
    pub fn delete(&self, name: &str) -> Result<()> {
        validate_segment(name)?;
        self.store.delete_dir(name)?;
        info!(backup = %name, store = %self.store.describe(), "Backup deleted");
        Ok(())
    }

    fn load(&self, name: BackupName) -> Result<Backup> {
        let dir = name.as_str();
        let mut files = Vec::new();
        let mut total_size_bytes = 0u64;

        for path in self.store.list_files(dir)? {
            let size = self.store.file_size(dir, &path)?;
            total_size_bytes += size;
            files.push(BackupFile { path, size });
        }

        let summary = if files.iter().any(|f| f.path == SUMMARY_FILE) {
            self.load_summary(dir)
        } else {
            None
        };

        Ok(Backup {
            created_at: name.timestamp(),
            name,
            files,
            total_size_bytes,
            total_size: format_bytes(total_size_bytes),
            summary,
        })
    }

    fn load_summary(&self, dir: &str) -> Option<BackupSummary> {
        let data = match self.store.read_file(dir, SUMMARY_FILE) {
            Ok(data) => data,
            Err(e) => {
                warn!(backup = %dir, error = %e, "Failed to read backup summary");
                return None;
            }
        };
        match BackupSummary::from_slice(&data) {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(backup = %dir, error = %e, "Ignoring malformed backup summary");
                None
            }
        }
    }
}
