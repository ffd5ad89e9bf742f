//! Storage for backup directories.
//!
//! A store exposes a flat set of backup directories under a `backups/`
//! namespace, each holding files addressed by `/`-separated relative paths.
//! No caching: every call goes to the underlying medium.

pub mod local;
pub mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

use crate::utils::errors::{BackupError, Result};

/// Directory-style storage for backups.
pub trait BackupStore: Send + Sync {
    /// Names of every directory directly under the backups namespace, sorted ascending.
    fn list_backup_dirs(&self) -> Result<Vec<String>>;

    fn exists(&self, dir: &str) -> Result<bool>;

    /// Create an empty backup directory. Fails with `AlreadyExists` if it is taken.
    fn create_dir(&self, dir: &str) -> Result<()>;

    /// Relative paths of every file in a backup directory, sorted ascending.
    fn list_files(&self, dir: &str) -> Result<Vec<String>>;

    fn file_size(&self, dir: &str, file: &str) -> Result<u64>;

    fn read_file(&self, dir: &str, file: &str) -> Result<Vec<u8>>;

    fn write_file(&self, dir: &str, file: &str, data: &[u8]) -> Result<()>;

    /// Remove a backup directory and everything in it.
    fn delete_dir(&self, dir: &str) -> Result<()>;

    /// Sum of the sizes of every file in a backup directory
    fn dir_size(&self, dir: &str) -> Result<u64> {
        let mut total = 0u64;
        for file in self.list_files(dir)? {
            total += self.file_size(dir, &file)?;
        }
        Ok(total)
    }

    /// Short description for log lines
    fn describe(&self) -> String;
}

/// Check a single path segment (a backup directory name or one component of a file path).
pub fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0'])
    {
        return Err(BackupError::InvalidPath(format!("'{}'", segment)));
    }
    Ok(())
}

/// Check a relative file path so it cannot leave its backup directory.
pub fn validate_relative_path(path: &str) -> Result<()> {
    if path.is_empty() || path.starts_with('/') {
        return Err(BackupError::InvalidPath(format!("'{}'", path)));
    }
    for component in path.split('/') {
        validate_segment(component)?;
    }
    Ok(())
}

/// Last component of a relative file path.
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
