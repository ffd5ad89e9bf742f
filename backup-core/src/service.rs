//! Wiring of store, catalog, producer, archiver, restorer and sweeper.

use crate::archive::BackupArchiver;
use crate::catalog::BackupCatalog;
use crate::config::Config;
use crate::producer::{BackupProducer, CommandExportRunner, ExportRunner};
use crate::restore::{CommandRestoreRunner, RestoreRunner, Restorer};
use crate::retention::RetentionSweeper;
use crate::store::{BackupStore, LocalStore};
use std::path::PathBuf;
use std::sync::Arc;

pub struct BackupService {
    pub catalog: BackupCatalog,
    pub producer: BackupProducer,
    pub archiver: BackupArchiver,
    pub restorer: Restorer,
    pub sweeper: RetentionSweeper,
}

impl BackupService {
    /// Filesystem store plus the configured external export/restore commands.
    pub fn from_config(config: &Config) -> Self {
        let store: Arc<dyn BackupStore> = Arc::new(LocalStore::new(&config.storage.root));
        let staging = config.storage.staging_dir();
        let exporter = Arc::new(CommandExportRunner::new(config.export.command(), staging.clone()));
        let restorer = Arc::new(CommandRestoreRunner::new(config.restore.command()));
        Self::new(store, exporter, restorer, staging)
    }

    pub fn new(
        store: Arc<dyn BackupStore>,
        exporter: Arc<dyn ExportRunner>,
        restorer: Arc<dyn RestoreRunner>,
        staging_dir: PathBuf,
    ) -> Self {
        Self {
            catalog: BackupCatalog::new(store.clone()),
            producer: BackupProducer::new(store.clone(), exporter),
            archiver: BackupArchiver::new(store.clone(), staging_dir.clone()),
            restorer: Restorer::new(store.clone(), restorer, staging_dir),
            sweeper: RetentionSweeper::new(store),
        }
    }
}
