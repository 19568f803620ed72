use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::empty_as_none;

/// Metadata for an uploaded blob; the bytes live on disk at `path`
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FileRecord {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub size: i64,
    pub mime_type: String,
    pub note_id: Option<i64>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub note_id: Option<i64>,
}

/// Reduce a client-supplied file name to its last path component
pub fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() || base == "." || base == ".." {
        "upload".to_string()
    } else {
        base.to_string()
    }
}

/// On-disk name for an upload: timestamp, random suffix, then the sanitized client name
pub fn stored_file_name(timestamp: i64, suffix: &str, name: &str) -> String {
    format!("{}_{}_{}", timestamp, suffix, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\tmp\\a.txt"), "a.txt");
        assert_eq!(sanitize_file_name(".."), "upload");
        assert_eq!(sanitize_file_name("dir/"), "upload");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[test]
    fn test_stored_file_name() {
        assert_eq!(
            stored_file_name(1733788800, "0a1b2c3d4e5f6071", "a.txt"),
            "1733788800_0a1b2c3d4e5f6071_a.txt"
        );
    }
}
