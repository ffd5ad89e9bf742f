//! Utility modules shared by the library and the binaries.

pub mod errors;
pub mod format;
pub mod logger;

pub use errors::{BackupError, Result};
pub use format::format_bytes;
