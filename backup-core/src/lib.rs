//! Backup management for the nomad guide admin.
//!
//! Backups are timestamp-named directories of exported data. This crate lists
//! and sizes them, produces new ones through an external exporter, bundles
//! them into zip archives, restores them and expires old ones.

pub mod archive;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod name;
pub mod process;
pub mod producer;
pub mod restore;
pub mod retention;
pub mod service;
pub mod store;
pub mod summary;
pub mod utils;

// Re-export commonly used types
pub use catalog::{Backup, BackupCatalog, CatalogStats, Listing};
pub use config::Config;
pub use name::BackupName;
pub use producer::{Category, ExportFormat};
pub use service::BackupService;
pub use store::BackupStore;
pub use utils::errors::{BackupError, Result};
