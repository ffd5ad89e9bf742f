//! Filesystem-backed store rooted at `<root>/backups`.

use super::{validate_relative_path, validate_segment, BackupStore};
use crate::utils::errors::{BackupError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const BACKUPS_DIR: &str = "backups";

#[derive(Debug, Clone)]
pub struct LocalStore {
    backups_root: PathBuf,
}

impl LocalStore {
    /// `root` is the storage area; backups live in its `backups/` subdirectory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            backups_root: root.as_ref().join(BACKUPS_DIR),
        }
    }

    pub fn backups_root(&self) -> &Path {
        &self.backups_root
    }

    fn dir_path(&self, dir: &str) -> Result<PathBuf> {
        validate_segment(dir)?;
        Ok(self.backups_root.join(dir))
    }

    fn file_path(&self, dir: &str, file: &str) -> Result<PathBuf> {
        validate_relative_path(file)?;
        Ok(self.dir_path(dir)?.join(file))
    }
}

/// Map `io::ErrorKind::NotFound` onto the domain error, keep the rest as storage failures.
fn map_io(err: io::Error, what: impl FnOnce() -> String) -> BackupError {
    if err.kind() == io::ErrorKind::NotFound {
        BackupError::NotFound(what())
    } else {
        BackupError::Storage(err)
    }
}

impl BackupStore for LocalStore {
    fn list_backup_dirs(&self) -> Result<Vec<String>> {
        let read_dir = match fs::read_dir(&self.backups_root) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut dirs = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                dirs.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn exists(&self, dir: &str) -> Result<bool> {
        Ok(self.dir_path(dir)?.is_dir())
    }

    fn create_dir(&self, dir: &str) -> Result<()> {
        let path = self.dir_path(dir)?;
        fs::create_dir_all(&self.backups_root)?;
        fs::create_dir(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                BackupError::AlreadyExists(dir.to_string())
            } else {
                BackupError::Storage(e)
            }
        })
    }

    fn list_files(&self, dir: &str) -> Result<Vec<String>> {
        let root = self.dir_path(dir)?;
        if !root.is_dir() {
            return Err(BackupError::NotFound(dir.to_string()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&root).min_depth(1).follow_links(false) {
            let entry = entry.map_err(|e| {
                BackupError::Storage(e.into_io_error().unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::Other, "directory walk failed")
                }))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect();
            files.push(parts.join("/"));
        }
        files.sort();
        Ok(files)
    }

    fn file_size(&self, dir: &str, file: &str) -> Result<u64> {
        let path = self.file_path(dir, file)?;
        let meta = fs::metadata(&path).map_err(|e| map_io(e, || format!("{}/{}", dir, file)))?;
        if !meta.is_file() {
            return Err(BackupError::NotFound(format!("{}/{}", dir, file)));
        }
        Ok(meta.len())
    }

    fn read_file(&self, dir: &str, file: &str) -> Result<Vec<u8>> {
        let path = self.file_path(dir, file)?;
        if path.is_dir() {
            return Err(BackupError::NotFound(format!("{}/{}", dir, file)));
        }
        fs::read(&path).map_err(|e| map_io(e, || format!("{}/{}", dir, file)))
    }

    fn write_file(&self, dir: &str, file: &str, data: &[u8]) -> Result<()> {
        let path = self.file_path(dir, file)?;
        if !self.dir_path(dir)?.is_dir() {
            return Err(BackupError::NotFound(dir.to_string()));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        Ok(())
    }

    fn delete_dir(&self, dir: &str) -> Result<()> {
        let path = self.dir_path(dir)?;
        if !path.is_dir() {
            return Err(BackupError::NotFound(dir.to_string()));
        }
        fs::remove_dir_all(&path).map_err(|e| map_io(e, || dir.to_string()))
    }

    fn describe(&self) -> String {
        format!("local:{}", self.backups_root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, LocalStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalStore::new(temp_dir.path());
        (temp_dir, store)
    }

    #[test]
    fn test_missing_root_lists_nothing() {
        let (_tmp, store) = store();
        assert!(store.list_backup_dirs().unwrap().is_empty());
    }

    #[test]
    fn test_lists_only_directories() -> Result<()> {
        let (_tmp, store) = store();
        store.create_dir("2024-01-02_00-00-00")?;
        store.create_dir("2024-01-01_00-00-00")?;
        fs::write(store.backups_root().join("stray.txt"), b"x")?;

        assert_eq!(
            store.list_backup_dirs()?,
            vec!["2024-01-01_00-00-00", "2024-01-02_00-00-00"]
        );
        Ok(())
    }

    #[test]
    fn test_nested_files_and_sizes() -> Result<()> {
        let (_tmp, store) = store();
        let dir = "2024-01-01_00-00-00";
        store.create_dir(dir)?;
        store.write_file(dir, "users.json", b"12345")?;
        store.write_file(dir, "tables/jobs.json", b"1234567")?;

        assert_eq!(store.list_files(dir)?, vec!["tables/jobs.json", "users.json"]);
        assert_eq!(store.file_size(dir, "tables/jobs.json")?, 7);
        assert_eq!(store.dir_size(dir)?, 12);
        assert_eq!(store.read_file(dir, "users.json")?, b"12345");
        Ok(())
    }

    #[test]
    fn test_create_twice_is_a_conflict() -> Result<()> {
        let (_tmp, store) = store();
        store.create_dir("2024-01-01_00-00-00")?;
        let err = store.create_dir("2024-01-01_00-00-00").unwrap_err();
        assert!(matches!(err, BackupError::AlreadyExists(_)));
        Ok(())
    }

    #[test]
    fn test_delete_then_missing() -> Result<()> {
        let (_tmp, store) = store();
        let dir = "2024-01-01_00-00-00";
        store.create_dir(dir)?;
        store.write_file(dir, "a.json", b"{}")?;

        store.delete_dir(dir)?;
        assert!(!store.exists(dir)?);
        assert!(matches!(store.delete_dir(dir), Err(BackupError::NotFound(_))));
        Ok(())
    }

    #[test]
    fn test_missing_file_is_not_found() -> Result<()> {
        let (_tmp, store) = store();
        store.create_dir("2024-01-01_00-00-00")?;
        let err = store.read_file("2024-01-01_00-00-00", "nope.json").unwrap_err();
        assert!(matches!(err, BackupError::NotFound(_)));
        Ok(())
    }

    #[test]
    fn test_traversal_is_rejected() {
        let (_tmp, store) = store();
        assert!(matches!(store.read_file("..", "etc/passwd"), Err(BackupError::InvalidPath(_))));
        assert!(matches!(
            store.read_file("2024-01-01_00-00-00", "../../secret"),
            Err(BackupError::InvalidPath(_))
        ));
    }
}
