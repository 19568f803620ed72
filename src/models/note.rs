use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{double_option, empty_as_none};
use super::taxonomy::{Category, Tag};

/// A note, with its category and tags attached after loading
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub color: String,
    pub is_encrypted: bool,
    pub is_pinned: bool,
    pub is_archived: bool,
    pub is_favorite: bool,
    pub is_markdown: bool,
    pub position: i64,
    pub category_id: Option<i64>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[sqlx(skip)]
    pub tags: Vec<Tag>,
}

impl Note {
    /// Whether the note carries any of the given tag ids
    pub fn has_any_tag(&self, tag_ids: &[i64]) -> bool {
        self.tags.iter().any(|t| tag_ids.contains(&t.id))
    }
}

/// What happened to a note when a history row was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Created,
    Updated,
    Deleted,
}

impl HistoryAction {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryAction::Created => "created",
            HistoryAction::Updated => "updated",
            HistoryAction::Deleted => "deleted",
        }
    }
}

/// Append-only snapshot of a note's title and content
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct NoteHistory {
    pub id: i64,
    pub note_id: i64,
    pub user_id: i64,
    pub action: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateNote {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub color: Option<String>,
    #[serde(default)]
    pub is_encrypted: bool,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_markdown: bool,
    #[serde(default)]
    pub position: i64,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

/// Fields a client may change on an existing note
///
/// Unknown keys are rejected. `category_id: null` clears the category,
/// `tag_ids` replaces the whole tag set.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub color: Option<String>,
    pub is_encrypted: Option<bool>,
    pub is_pinned: Option<bool>,
    pub is_archived: Option<bool>,
    pub is_favorite: Option<bool>,
    pub is_markdown: Option<bool>,
    pub position: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    pub tag_ids: Option<Vec<i64>>,
}

impl NotePatch {
    /// Apply scalar fields to `note`; returns true when title or content changed
    pub fn apply(&self, note: &mut Note) -> bool {
        let old_title = note.title.clone();
        let old_content = note.content.clone();

        if let Some(title) = &self.title {
            note.title = title.clone();
        }
        if let Some(content) = &self.content {
            note.content = content.clone();
        }
        if let Some(color) = &self.color {
            note.color = color.clone();
        }
        if let Some(v) = self.is_encrypted {
            note.is_encrypted = v;
        }
        if let Some(v) = self.is_pinned {
            note.is_pinned = v;
        }
        if let Some(v) = self.is_archived {
            note.is_archived = v;
        }
        if let Some(v) = self.is_favorite {
            note.is_favorite = v;
        }
        if let Some(v) = self.is_markdown {
            note.is_markdown = v;
        }
        if let Some(v) = self.position {
            note.position = v;
        }
        if let Some(category_id) = self.category_id {
            note.category_id = category_id;
        }

        note.title != old_title || note.content != old_content
    }
}

/// `GET /api/notes` filters
#[derive(Debug, Default, Deserialize)]
pub struct NoteListQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub archived: Option<bool>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub pinned: Option<bool>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Structured filter for `POST /api/search`
#[derive(Debug, Default, Deserialize)]
pub struct AdvancedSearch {
    #[serde(default)]
    pub query: String,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    pub is_archived: Option<bool>,
    #[serde(default)]
    pub date_from: String,
    #[serde(default)]
    pub date_to: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub format: Option<String>,
}

/// An ordered fragment of a note with a stable external identifier
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Block {
    pub id: i64,
    pub block_id: String,
    pub content: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub block_type: String,
    pub level: i64,
    pub position: i64,
    pub note_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct BlockInput {
    pub block_id: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type")]
    pub block_type: Option<String>,
    #[serde(default)]
    pub level: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_note() -> Note {
        let now = Utc::now();
        Note {
            id: 1,
            title: "Hi".to_string(),
            content: "World".to_string(),
            color: "#00ffff".to_string(),
            is_encrypted: false,
            is_pinned: false,
            is_archived: false,
            is_favorite: false,
            is_markdown: false,
            position: 0,
            category_id: Some(3),
            user_id: 1,
            created_at: now,
            updated_at: now,
            category: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_patch_flags_only_does_not_report_change() {
        let mut note = sample_note();
        let patch: NotePatch = serde_json::from_str(r#"{"is_pinned":true}"#).unwrap();

        assert!(!patch.apply(&mut note));
        assert!(note.is_pinned);
    }

    #[test]
    fn test_patch_content_reports_change() {
        let mut note = sample_note();
        let patch: NotePatch = serde_json::from_str(r#"{"content":"World2"}"#).unwrap();

        assert!(patch.apply(&mut note));
        assert_eq!(note.content, "World2");
        assert_eq!(note.title, "Hi");
    }

    #[test]
    fn test_patch_same_title_is_not_a_change() {
        let mut note = sample_note();
        let patch: NotePatch = serde_json::from_str(r#"{"title":"Hi"}"#).unwrap();

        assert!(!patch.apply(&mut note));
    }

    #[test]
    fn test_patch_category_null_clears() {
        let mut note = sample_note();
        let patch: NotePatch = serde_json::from_str(r#"{"category_id":null}"#).unwrap();
        patch.apply(&mut note);
        assert_eq!(note.category_id, None);

        let mut note = sample_note();
        let patch: NotePatch = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        patch.apply(&mut note);
        assert_eq!(note.category_id, Some(3));
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        assert!(serde_json::from_str::<NotePatch>(r#"{"user_id":2}"#).is_err());
        assert!(serde_json::from_str::<NotePatch>(r#"{"id":9}"#).is_err());
    }

    #[test]
    fn test_has_any_tag() {
        let mut note = sample_note();
        assert!(!note.has_any_tag(&[1]));

        note.tags.push(Tag {
            id: 5,
            name: "work".to_string(),
            color: "#ff0080".to_string(),
            user_id: 1,
            created_at: Utc::now(),
        });
        assert!(note.has_any_tag(&[1, 5]));
        assert!(!note.has_any_tag(&[]));
    }
}
