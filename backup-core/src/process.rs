//! External command invocation for the export and restore tools.

use crate::utils::errors::{BackupError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Program plus fixed leading arguments; per-call arguments are appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Run to completion and return stdout followed by stderr.
    /// A non-zero exit is an `ExternalProcess` error carrying the same output.
    pub fn run(&self, extra_args: &[String]) -> Result<String> {
        debug!(program = %self.program.display(), args = ?extra_args, "Running external command");

        let output = Command::new(&self.program)
            .args(&self.args)
            .args(extra_args)
            .output()
            .map_err(|e| BackupError::ExternalProcess {
                message: format!("Failed to start {}: {}", self.program.display(), e),
                output: String::new(),
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }

        if !output.status.success() {
            return Err(BackupError::ExternalProcess {
                message: format!("{} exited with {}", self.program.display(), output.status),
                output: text,
            });
        }

        Ok(text)
    }
}
