use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Category, Note, Reminder, Tag, Template};

/// Metadata for a point-in-time export written to the backup directory
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Backup {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub size: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Backup {
    /// File name for a snapshot taken at `timestamp`; `suffix` separates snapshots within a second
    pub fn file_name(user_id: i64, timestamp: i64, suffix: &str) -> String {
        format!("backup_{}_{}_{}.json", user_id, timestamp, suffix)
    }
}

/// Frozen copy of a user's data, serialized at backup time
#[derive(Debug, Serialize)]
pub struct BackupSnapshot {
    pub notes: Vec<Note>,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
    pub templates: Vec<Template>,
    pub reminders: Vec<Reminder>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CreateBackupResponse {
    pub backup: Backup,
    pub download_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        assert_eq!(
            Backup::file_name(4, 1733788800, "00ff00ff00ff00ff"),
            "backup_4_1733788800_00ff00ff00ff00ff.json"
        );
    }
}
