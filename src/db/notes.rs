//! Note persistence shared by the note, search, share, sync, backup and
//! daily-note handlers.

use chrono::Utc;
use sqlx::SqliteConnection;
use std::collections::HashMap;

use crate::constants::{ERR_NOTE_NOT_FOUND, ERR_UNKNOWN_CATEGORY};
use crate::error::{AppError, Result};
use crate::models::note::HistoryAction;
use crate::models::{Category, Note, Tag};

#[derive(sqlx::FromRow)]
struct NoteTagRow {
    note_id: i64,
    #[sqlx(flatten)]
    tag: Tag,
}

/// Attach each note's category and tags, loaded in two queries
pub async fn attach_relations(
    conn: &mut SqliteConnection,
    user_id: i64,
    notes: &mut [Note],
) -> Result<()> {
    if notes.is_empty() {
        return Ok(());
    }

    let categories: HashMap<i64, Category> =
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

    let rows = sqlx::query_as::<_, NoteTagRow>(
        "SELECT nt.note_id, t.* FROM note_tags nt
         JOIN tags t ON t.id = nt.tag_id
         WHERE t.user_id = ?
         ORDER BY t.name, t.id",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut tags_by_note: HashMap<i64, Vec<Tag>> = HashMap::new();
    for row in rows {
        tags_by_note.entry(row.note_id).or_default().push(row.tag);
    }

    for note in notes.iter_mut() {
        note.category = note.category_id.and_then(|id| categories.get(&id).cloned());
        note.tags = tags_by_note.remove(&note.id).unwrap_or_default();
    }

    Ok(())
}

/// Load one of the caller's notes with relations; other users' notes are "not found"
pub async fn fetch_note(conn: &mut SqliteConnection, user_id: i64, note_id: i64) -> Result<Note> {
    let note = sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = ? AND user_id = ?")
        .bind(note_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotFound(ERR_NOTE_NOT_FOUND))?;

    let mut notes = [note];
    attach_relations(conn, user_id, &mut notes).await?;
    let [note] = notes;
    Ok(note)
}

/// Fail with 404 unless `note_id` names one of the caller's notes
pub async fn ensure_note_owned(
    conn: &mut SqliteConnection,
    user_id: i64,
    note_id: i64,
) -> Result<()> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM notes WHERE id = ? AND user_id = ?")
        .bind(note_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    match exists {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(ERR_NOTE_NOT_FOUND)),
    }
}

/// Fail with 400 unless `category_id` is absent or names one of the caller's categories
pub async fn ensure_category_owned(
    conn: &mut SqliteConnection,
    user_id: i64,
    category_id: Option<i64>,
) -> Result<()> {
    let Some(category_id) = category_id else {
        return Ok(());
    };

    let exists: Option<i64> =
        sqlx::query_scalar("SELECT id FROM categories WHERE id = ? AND user_id = ?")
            .bind(category_id)
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;

    match exists {
        Some(_) => Ok(()),
        None => Err(AppError::InvalidInput(ERR_UNKNOWN_CATEGORY.to_string())),
    }
}

/// Replace a note's tag set. Ids that are not the caller's tags are skipped.
pub async fn replace_tags(
    conn: &mut SqliteConnection,
    user_id: i64,
    note_id: i64,
    tag_ids: &[i64],
) -> Result<()> {
    sqlx::query("DELETE FROM note_tags WHERE note_id = ?")
        .bind(note_id)
        .execute(&mut *conn)
        .await?;

    for tag_id in tag_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO note_tags (note_id, tag_id)
             SELECT ?, id FROM tags WHERE id = ? AND user_id = ?",
        )
        .bind(note_id)
        .bind(tag_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Append a history row snapshotting the note's current title and content
pub async fn record_history(
    conn: &mut SqliteConnection,
    note: &Note,
    action: HistoryAction,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO note_history (note_id, user_id, action, title, content, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(note.id)
    .bind(note.user_id)
    .bind(action.as_str())
    .bind(&note.title)
    .bind(&note.content)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    tracing::debug!("Recorded '{}' history for note {}", action.as_str(), note.id);
    Ok(())
}

/// Write every mutable column of `note` back to its row
pub async fn update_note_row(conn: &mut SqliteConnection, note: &Note) -> Result<()> {
    sqlx::query(
        "UPDATE notes SET title = ?, content = ?, color = ?, is_encrypted = ?, is_pinned = ?,
             is_archived = ?, is_favorite = ?, is_markdown = ?, position = ?, category_id = ?,
             updated_at = ?
         WHERE id = ? AND user_id = ?",
    )
    .bind(&note.title)
    .bind(&note.content)
    .bind(&note.color)
    .bind(note.is_encrypted)
    .bind(note.is_pinned)
    .bind(note.is_archived)
    .bind(note.is_favorite)
    .bind(note.is_markdown)
    .bind(note.position)
    .bind(note.category_id)
    .bind(note.updated_at)
    .bind(note.id)
    .bind(note.user_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
