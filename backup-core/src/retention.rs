//! Retention sweeper: delete backups older than a cutoff.

use crate::catalog::SkippedEntry;
use crate::name::BackupName;
use crate::store::BackupStore;
use crate::utils::errors::{BackupError, Result};
use chrono::{Duration, Local, NaiveDateTime};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// What a sweep did. Every examined directory ends up in exactly one list
/// or was young enough to keep.
#[derive(Debug, Default, Serialize)]
pub struct SweepReport {
    pub cutoff: Option<NaiveDateTime>,
    pub removed: Vec<String>,
    pub failed: Vec<SkippedEntry>,
    /// Directories whose names are not backup timestamps; never deleted
    pub skipped: Vec<SkippedEntry>,
    pub kept: usize,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct RetentionSweeper {
    store: Arc<dyn BackupStore>,
}

impl RetentionSweeper {
    pub fn new(store: Arc<dyn BackupStore>) -> Self {
        Self { store }
    }

    /// Sweep relative to the current local time.
    pub fn cleanup_older_than(&self, cutoff_days: u32) -> Result<SweepReport> {
        self.sweep(cutoff_days, Local::now().naive_local())
    }

    /// Delete every backup whose timestamp is strictly before `now - cutoff_days`.
    /// A failed delete is recorded and the sweep moves on.
    pub fn sweep(&self, cutoff_days: u32, now: NaiveDateTime) -> Result<SweepReport> {
        let cutoff = Duration::try_days(i64::from(cutoff_days))
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or(BackupError::InvalidRetention(cutoff_days))?;
        let mut report = SweepReport {
            cutoff: Some(cutoff),
            ..Default::default()
        };

        for dir in self.store.list_backup_dirs()? {
            let name = match BackupName::parse(&dir) {
                Ok(name) => name,
                Err(e) => {
                    report.skipped.push(SkippedEntry { name: dir, reason: e.to_string() });
                    continue;
                }
            };

            if name.timestamp() >= cutoff {
                report.kept += 1;
                continue;
            }

            match self.store.delete_dir(name.as_str()) {
                Ok(()) => {
                    info!(backup = %name, "Removed expired backup");
                    report.removed.push(dir);
                }
                Err(e) => {
                    warn!(backup = %name, error = %e, "Failed to remove expired backup");
                    report.failed.push(SkippedEntry { name: dir, reason: e.to_string() });
                }
            }
        }

        info!(
            cutoff_days,
            removed = report.removed.len(),
            failed = report.failed.len(),
            kept = report.kept,
            "Retention sweep finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::utils::errors::BackupError;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn days_old(days: i64) -> String {
        BackupName::from_timestamp(now() - Duration::days(days)).to_string()
    }

    #[test]
    fn test_removes_only_expired() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        for days in [10, 31, 45] {
            store.create_dir(&days_old(days))?;
        }
        let sweeper = RetentionSweeper::new(store.clone());

        let report = sweeper.sweep(30, now())?;
        let mut removed = report.removed.clone();
        removed.sort();
        let mut expected = vec![days_old(45), days_old(31)];
        expected.sort();

        assert_eq!(removed, expected);
        assert_eq!(report.kept, 1);
        assert_eq!(store.list_backup_dirs()?, vec![days_old(10)]);
        Ok(())
    }

    #[test]
    fn test_window_past_calendar_range_is_rejected() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        store.create_dir(&days_old(45))?;
        let sweeper = RetentionSweeper::new(store.clone());

        let err = sweeper.cleanup_older_than(u32::MAX).unwrap_err();
        assert!(matches!(err, BackupError::InvalidRetention(u32::MAX)));
        assert!(err.is_client_error());
        assert_eq!(store.list_backup_dirs()?, vec![days_old(45)]);
        Ok(())
    }

    #[test]
    fn test_exact_cutoff_is_kept() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        store.create_dir(&days_old(30))?;
        let report = RetentionSweeper::new(store).sweep(30, now())?;
        assert!(report.removed.is_empty());
        assert_eq!(report.kept, 1);
        Ok(())
    }

    #[test]
    fn test_empty_store_is_noop() -> Result<()> {
        let report = RetentionSweeper::new(Arc::new(MemoryStore::new())).sweep(30, now())?;
        assert!(report.removed.is_empty() && report.failed.is_empty() && report.kept == 0);
        Ok(())
    }

    #[test]
    fn test_malformed_names_are_never_deleted() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        store.create_dir("scratch")?;
        let report = RetentionSweeper::new(store.clone()).sweep(0, now())?;
        assert_eq!(report.skipped.len(), 1);
        assert!(store.exists("scratch")?);
        Ok(())
    }

    /// Refuses to delete one particular directory.
    struct StubbornStore {
        inner: MemoryStore,
        stuck: String,
    }

    impl BackupStore for StubbornStore {
        fn list_backup_dirs(&self) -> Result<Vec<String>> {
            self.inner.list_backup_dirs()
        }
        fn exists(&self, dir: &str) -> Result<bool> {
            self.inner.exists(dir)
        }
        fn create_dir(&self, dir: &str) -> Result<()> {
            self.inner.create_dir(dir)
        }
        fn list_files(&self, dir: &str) -> Result<Vec<String>> {
            self.inner.list_files(dir)
        }
        fn file_size(&self, dir: &str, file: &str) -> Result<u64> {
            self.inner.file_size(dir, file)
        }
        fn read_file(&self, dir: &str, file: &str) -> Result<Vec<u8>> {
            self.inner.read_file(dir, file)
        }
        fn write_file(&self, dir: &str, file: &str, data: &[u8]) -> Result<()> {
            self.inner.write_file(dir, file, data)
        }
        fn delete_dir(&self, dir: &str) -> Result<()> {
            if dir == self.stuck {
                return Err(BackupError::Storage(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only volume",
                )));
            }
            self.inner.delete_dir(dir)
        }
        fn describe(&self) -> String {
            "stubborn".to_string()
        }
    }

    #[test]
    fn test_failure_does_not_stop_sweep() -> Result<()> {
        let store = Arc::new(StubbornStore {
            inner: MemoryStore::new(),
            stuck: days_old(60),
        });
        for days in [40, 60, 90] {
            store.create_dir(&days_old(days))?;
        }

        let report = RetentionSweeper::new(store.clone()).sweep(30, now())?;
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].name, days_old(60));
        assert_eq!(report.removed.len(), 2);
        assert!(!report.is_clean());
        assert_eq!(store.list_backup_dirs()?, vec![days_old(60)]);
        Ok(())
    }
}
