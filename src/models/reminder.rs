use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::empty_as_none;

/// Scheduled alert, optionally attached to a note
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Reminder {
    pub id: i64,
    pub title: String,
    pub date_time: DateTime<Utc>,
    pub is_active: bool,
    pub is_repeat: bool,
    pub repeat_type: Option<String>,
    pub note_id: Option<i64>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for creating or replacing a reminder
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReminderInput {
    pub title: String,
    pub date_time: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_repeat: bool,
    pub repeat_type: Option<String>,
    pub note_id: Option<i64>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct ReminderQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_input_defaults() {
        let input: ReminderInput =
            serde_json::from_str(r#"{"title":"Call","date_time":"2025-03-01T09:00:00Z"}"#).unwrap();

        assert!(input.is_active);
        assert!(!input.is_repeat);
        assert!(input.note_id.is_none());
    }

    #[test]
    fn test_reminder_input_requires_date() {
        assert!(serde_json::from_str::<ReminderInput>(r#"{"title":"Call"}"#).is_err());
    }
}
