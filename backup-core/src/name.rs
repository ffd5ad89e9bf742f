//! Backup identifiers.
//!
//! Every backup lives in a directory named after the moment it was taken,
//! `YYYY-MM-DD_HH-MM-SS`. The format is fixed-width and zero-padded, so plain
//! string ordering of names matches chronological ordering.

use crate::utils::errors::{BackupError, Result};
use chrono::{Local, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::fmt;

pub const NAME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const NAME_LEN: usize = 19;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BackupName(String);

impl BackupName {
    /// Parse a directory name, rejecting anything that is not a zero-padded timestamp.
    pub fn parse(name: &str) -> Result<Self> {
        if name.len() != NAME_LEN {
            return Err(BackupError::invalid_name(
                name,
                format!("expected {} characters in YYYY-MM-DD_HH-MM-SS form", NAME_LEN),
            ));
        }
        let parsed = NaiveDateTime::parse_from_str(name, NAME_FORMAT)
            .map_err(|e| BackupError::invalid_name(name, e.to_string()))?;

        // chrono accepts unpadded fields; the round trip pins the fixed-width layout.
        if parsed.format(NAME_FORMAT).to_string() != name {
            return Err(BackupError::invalid_name(name, "fields must be zero-padded"));
        }

        Ok(Self(name.to_string()))
    }

    pub fn from_timestamp(ts: NaiveDateTime) -> Self {
        Self(ts.format(NAME_FORMAT).to_string())
    }

    /// Name for a backup taken right now, in server-local time.
    pub fn now() -> Self {
        Self::from_timestamp(Local::now().naive_local())
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        // Only constructed from a validated string or from a timestamp.
        NaiveDateTime::parse_from_str(&self.0, NAME_FORMAT).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BackupName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for BackupName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
