//! In-process store, handy for tests and dry runs.

use super::{validate_relative_path, validate_segment, BackupStore};
use crate::utils::errors::{BackupError, Result};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type Dirs = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    dirs: RwLock<Dirs>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Dirs> {
        self.dirs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Dirs> {
        self.dirs.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl BackupStore for MemoryStore {
    fn list_backup_dirs(&self) -> Result<Vec<String>> {
        Ok(self.read().keys().cloned().collect())
    }

    fn exists(&self, dir: &str) -> Result<bool> {
        validate_segment(dir)?;
        Ok(self.read().contains_key(dir))
    }

    fn create_dir(&self, dir: &str) -> Result<()> {
        validate_segment(dir)?;
        let mut dirs = self.write();
        if dirs.contains_key(dir) {
            return Err(BackupError::AlreadyExists(dir.to_string()));
        }
        dirs.insert(dir.to_string(), BTreeMap::new());
        Ok(())
    }

    fn list_files(&self, dir: &str) -> Result<Vec<String>> {
        validate_segment(dir)?;
        self.read()
            .get(dir)
            .map(|files| files.keys().cloned().collect())
            .ok_or_else(|| BackupError::NotFound(dir.to_string()))
    }

    fn file_size(&self, dir: &str, file: &str) -> Result<u64> {
        self.read_file(dir, file).map(|data| data.len() as u64)
    }

    fn read_file(&self, dir: &str, file: &str) -> Result<Vec<u8>> {
        validate_segment(dir)?;
        validate_relative_path(file)?;
        self.read()
            .get(dir)
            .and_then(|files| files.get(file))
            .cloned()
            .ok_or_else(|| BackupError::NotFound(format!("{}/{}", dir, file)))
    }

    fn write_file(&self, dir: &str, file: &str, data: &[u8]) -> Result<()> {
        validate_segment(dir)?;
        validate_relative_path(file)?;
        let mut dirs = self.write();
        let files = dirs
            .get_mut(dir)
            .ok_or_else(|| BackupError::NotFound(dir.to_string()))?;
        files.insert(file.to_string(), data.to_vec());
        Ok(())
    }

    fn delete_dir(&self, dir: &str) -> Result<()> {
        validate_segment(dir)?;
        self.write()
            .remove(dir)
            .map(|_| ())
            .ok_or_else(|| BackupError::NotFound(dir.to_string()))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_requires_directory() {
        let store = MemoryStore::new();
        let err = store.write_file("2024-01-01_00-00-00", "a.json", b"{}").unwrap_err();
        assert!(matches!(err, BackupError::NotFound(_)));
    }

    #[test]
    fn test_roundtrip_and_delete() -> Result<()> {
        let store = MemoryStore::new();
        store.create_dir("2024-01-01_00-00-00")?;
        store.write_file("2024-01-01_00-00-00", "a.json", b"abc")?;
        assert_eq!(store.dir_size("2024-01-01_00-00-00")?, 3);

        store.delete_dir("2024-01-01_00-00-00")?;
        assert!(store.list_backup_dirs()?.is_empty());
        Ok(())
    }
}
