use crate::config::AppConfig;
use crate::error::AppError;
use backup_core::auth::{AccessPolicy, Action, AllowList, Principal};
use backup_core::BackupService;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct AppState {
    pub config: AppConfig,
    pub backups: BackupService,
    pub policy: Arc<dyn AccessPolicy>,
    /// Held for the duration of a retention sweep
    pub sweep_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let backups = BackupService::from_config(&config.backup);
        let policy = AllowList::from_csv(&config.admin_emails, &config.viewer_emails);
        if policy.is_empty() {
            tracing::warn!("ADMIN_EMAILS and VIEWER_EMAILS are empty; every request will be refused");
        }
        Self::with_service(config, backups, Arc::new(policy))
    }

    pub fn with_service(config: AppConfig, backups: BackupService, policy: Arc<dyn AccessPolicy>) -> Self {
        Self {
            config,
            backups,
            policy,
            sweep_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn authorize(&self, principal: Option<&Principal>, action: Action) -> Result<(), AppError> {
        self.policy.authorize(principal, action).map_err(AppError::from)
    }
}
