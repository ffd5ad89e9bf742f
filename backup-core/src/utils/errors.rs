//! Error types for backup operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backup not found: {0}")]
    NotFound(String),

    #[error("Invalid backup name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid backup type: {0}")]
    InvalidCategory(String),

    #[error("Invalid export format: {0}")]
    InvalidFormat(String),

    #[error("Invalid table selector: {0}")]
    InvalidTable(String),

    #[error("Invalid retention window: {0} days")]
    InvalidRetention(u32),

    #[error("Backup already exists: {0}")]
    AlreadyExists(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{message}")]
    ExternalProcess { message: String, output: String },

    #[error("Authentication required")]
    Unauthorized,

    #[error("Permission denied: {0}")]
    Forbidden(String),
}

impl BackupError {
    pub(crate) fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        BackupError::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller's input rather than the storage or an external tool.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BackupError::InvalidName { .. }
                | BackupError::InvalidPath(_)
                | BackupError::InvalidCategory(_)
                | BackupError::InvalidFormat(_)
                | BackupError::InvalidTable(_)
                | BackupError::InvalidRetention(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
