use backup_core::Config;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub backup: Config,
    pub admin_emails: String,
    pub viewer_emails: String,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let mut backup = match std::env::var("BACKUP_CONFIG") {
            Ok(path) => Config::from_file(&PathBuf::from(path))?,
            Err(_) => Config::default(),
        };
        backup.apply_env_overrides()?;

        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            backup,
            admin_emails: std::env::var("ADMIN_EMAILS").unwrap_or_default(),
            viewer_emails: std::env::var("VIEWER_EMAILS").unwrap_or_default(),
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(300),
            ),
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            backup: Config::default(),
            admin_emails: String::new(),
            viewer_emails: String::new(),
            request_timeout: Duration::from_secs(300),
        }
    }
}
