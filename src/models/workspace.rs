use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{empty_as_none, Note};

/// A saved UI layout; at most one per user is active
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Workspace {
    pub id: i64,
    pub name: String,
    pub layout: String,
    pub is_active: bool,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceInput {
    pub name: String,
    #[serde(default)]
    pub layout: String,
}

/// One-per-day binding between a user and an auto-created note
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailyNote {
    pub id: i64,
    pub date: String,
    pub note_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Note>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DailyNoteQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub date: Option<String>,
}

impl DailyNote {
    pub fn title_for(date: &str) -> String {
        format!("Daily Note - {}", date)
    }

    pub fn body_for(date: &str) -> String {
        format!(
            "# {}\n\n## Tasks\n- [ ] \n\n## Notes\n\n## Reflection\n",
            date
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_note_template() {
        assert_eq!(DailyNote::title_for("2025-01-31"), "Daily Note - 2025-01-31");

        let body = DailyNote::body_for("2025-01-31");
        assert!(body.starts_with("# 2025-01-31\n"));
        assert!(body.contains("## Tasks\n- [ ] \n"));
        assert!(body.ends_with("## Reflection\n"));
    }
}
