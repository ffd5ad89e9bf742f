//! Backup archiver: bundle one backup into a zip for download.
//!
//! The archive is staged in a temporary file that is deleted when the
//! returned [`StagedArchive`] is dropped, or straight away if building fails.

use crate::store::{base_name, validate_segment, BackupStore};
use crate::utils::errors::Result;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Download name for a backup's archive
pub fn archive_file_name(name: &str) -> String {
    format!("backup_{}.zip", name)
}

/// A finished archive on local disk.
#[derive(Debug)]
pub struct StagedArchive {
    file_name: String,
    path: TempPath,
    size: u64,
    entries: usize,
}

impl StagedArchive {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Move the archive to a permanent location instead of deleting it on drop.
    pub fn persist(self, dest: impl AsRef<Path>) -> Result<()> {
        let dest = dest.as_ref();
        if let Err(e) = self.path.persist(dest) {
            // Rename fails across filesystems; copy and let the staged file drop.
            std::fs::copy(&e.path, dest)?;
        }
        Ok(())
    }
}

pub struct BackupArchiver {
    store: Arc<dyn BackupStore>,
    staging_dir: PathBuf,
}

impl BackupArchiver {
    pub fn new(store: Arc<dyn BackupStore>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            staging_dir: staging_dir.into(),
        }
    }

    /// Zip every file of backup `name`, flattened to base names.
    /// When two files share a base name only the first (in path order) is kept.
    pub fn build(&self, name: &str) -> Result<StagedArchive> {
        validate_segment(name)?;
        let files = self.store.list_files(name)?;

        std::fs::create_dir_all(&self.staging_dir)?;
        let (file, path) = tempfile::Builder::new()
            .prefix("backup-archive-")
            .suffix(".zip")
            .tempfile_in(&self.staging_dir)?
            .into_parts();

        // `path` removes the staged file if anything below fails.
        let entries = self.write_archive(name, &files, file)?;
        let size = std::fs::metadata(&path)?.len();

        info!(backup = %name, entries, bytes = size, "Backup archive built");
        Ok(StagedArchive {
            file_name: archive_file_name(name),
            path,
            size,
            entries,
        })
    }

    fn write_archive(&self, name: &str, files: &[String], file: File) -> Result<usize> {
        let mut zip = ZipWriter::new(BufWriter::new(file));
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .compression_level(Some(6));

        let mut seen = HashSet::new();
        for rel_path in files {
            let entry_name = base_name(rel_path);
            if !seen.insert(entry_name.to_string()) {
                warn!(backup = %name, path = %rel_path, "Duplicate file name in archive, skipping");
                continue;
            }
            let data = self.store.read_file(name, rel_path)?;
            zip.start_file(entry_name, options)?;
            zip.write_all(&data)?;
        }

        let mut writer = zip.finish()?;
        writer.flush()?;
        Ok(seen.len())
    }
}
