use crate::state::AppState;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Runs the retention sweep on the configured cron schedule.
pub struct RetentionScheduler {
    scheduler: Mutex<JobScheduler>,
    state: Arc<AppState>,
}

impl RetentionScheduler {
    pub async fn new(state: Arc<AppState>) -> anyhow::Result<Self> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            scheduler: Mutex::new(scheduler),
            state,
        })
    }

    pub async fn schedule_sweep(&self) -> anyhow::Result<()> {
        let retention = &self.state.config.backup.retention;
        let cron = retention.cron.clone();
        let days = retention.days;
        let state = self.state.clone();

        let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
            let state = state.clone();
            Box::pin(async move {
                run_sweep(state, days).await;
            })
        })?;

        self.scheduler.lock().await.add(job).await?;
        tracing::info!(cron = %cron, days, "Retention sweep scheduled");
        Ok(())
    }

    pub async fn start(&self) -> anyhow::Result<()> {
        self.scheduler.lock().await.start().await?;
        Ok(())
    }

    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.scheduler.lock().await.shutdown().await?;
        Ok(())
    }
}

async fn run_sweep(state: Arc<AppState>, days: u32) {
    let Ok(sweeping) = state.sweep_lock.clone().try_lock_owned() else {
        tracing::warn!("Skipping scheduled retention sweep: a cleanup is already running");
        return;
    };

    let started = chrono::Local::now();
    let sweeper_state = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let _sweeping = sweeping;
        sweeper_state.backups.sweeper.cleanup_older_than(days)
    })
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .and_then(|r| r.map_err(anyhow::Error::from));

    match result {
        Ok(report) => {
            let elapsed_ms = (chrono::Local::now() - started).num_milliseconds();
            if report.is_clean() {
                tracing::info!(
                    removed = report.removed.len(),
                    kept = report.kept,
                    elapsed_ms,
                    "Scheduled retention sweep finished"
                );
            } else {
                tracing::warn!(
                    removed = report.removed.len(),
                    failed = report.failed.len(),
                    elapsed_ms,
                    "Scheduled retention sweep finished with failures"
                );
            }
        }
        Err(e) => tracing::error!(error = %e, "Scheduled retention sweep failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use backup_core::auth::AllowList;
    use backup_core::producer::{ExportOutput, ExportRunner};
    use backup_core::restore::{RestoreRunner, TableSelector};
    use backup_core::store::{BackupStore, MemoryStore};
    use backup_core::{BackupService, ExportFormat};
    use std::path::Path;
    use tempfile::TempDir;

    struct NoExport;

    impl ExportRunner for NoExport {
        fn run(&self, _target: &str, _format: ExportFormat) -> backup_core::Result<ExportOutput> {
            Ok(ExportOutput::default())
        }
    }

    struct NoRestore;

    impl RestoreRunner for NoRestore {
        fn run(&self, _source: &Path, _table: &TableSelector) -> backup_core::Result<String> {
            Ok(String::new())
        }
    }

    fn state(store: Arc<MemoryStore>, staging: &TempDir) -> Arc<AppState> {
        let service = BackupService::new(
            store,
            Arc::new(NoExport),
            Arc::new(NoRestore),
            staging.path().to_path_buf(),
        );
        Arc::new(AppState::with_service(
            AppConfig::default(),
            service,
            Arc::new(AllowList::from_csv("", "")),
        ))
    }

    #[tokio::test]
    async fn test_sweep_removes_expired() {
        let staging = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.create_dir("2000-01-01_00-00-00").unwrap();
        store.create_dir("2999-01-01_00-00-00").unwrap();

        run_sweep(state(store.clone(), &staging), 30).await;

        assert_eq!(store.list_backup_dirs().unwrap(), vec!["2999-01-01_00-00-00"]);
    }

    #[tokio::test]
    async fn test_sweep_skipped_while_locked() {
        let staging = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.create_dir("2000-01-01_00-00-00").unwrap();
        let state = state(store.clone(), &staging);

        let guard = state.sweep_lock.lock().await;
        run_sweep(state.clone(), 30).await;
        drop(guard);

        assert!(store.exists("2000-01-01_00-00-00").unwrap());
    }

    #[tokio::test]
    async fn test_rejects_bad_cron() {
        let staging = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.backup.retention.cron = "not a schedule".into();
        let service = BackupService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(NoExport),
            Arc::new(NoRestore),
            staging.path().to_path_buf(),
        );
        let state = Arc::new(AppState::with_service(config, service, Arc::new(AllowList::from_csv("", ""))));

        let scheduler = RetentionScheduler::new(state).await.unwrap();
        assert!(scheduler.schedule_sweep().await.is_err());
    }
}
