//! Per-backup summary document.
//!
//! Serialized as `backup_summary.json` in each backup directory. Exporters may
//! write their own version with extra keys; unknown keys are preserved.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const SUMMARY_FILE: &str = "backup_summary.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Exported tables, in the order they were written
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_files: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<u64>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BackupSummary {
    pub fn from_slice(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    pub fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_keys_are_kept() {
        let raw = br#"{"category":"users","tables":["users"],"row_counts":{"users":12}}"#;
        let summary = BackupSummary::from_slice(raw).unwrap();
        assert_eq!(summary.category.as_deref(), Some("users"));
        assert_eq!(summary.tables, vec!["users"]);
        assert_eq!(summary.extra["row_counts"]["users"], 12);

        let back: serde_json::Value = serde_json::from_slice(&summary.to_vec().unwrap()).unwrap();
        assert_eq!(back["row_counts"]["users"], 12);
        assert!(back.get("created_at").is_none());
    }
}
