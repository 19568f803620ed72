use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::{QueryBuilder, Sqlite};

use crate::auth::AuthUser;
use crate::constants::DEFAULT_NOTE_COLOR;
use crate::db::notes::{
    attach_relations, ensure_category_owned, fetch_note, record_history, replace_tags,
    update_note_row,
};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::note::{
    AdvancedSearch, CreateNote, ExportQuery, HistoryAction, NoteListQuery, NotePatch, SearchQuery,
};
use crate::models::{Note, NoteHistory};
use crate::routes::validation::{parse_date, start_of_day};
use crate::routes::MessageResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct NotesResponse {
    pub notes: Vec<Note>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub notes: Vec<Note>,
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AdvancedSearchResponse {
    pub total: usize,
    pub notes: Vec<Note>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<NoteHistory>,
}

/// Run a note query and attach categories and tags
async fn load_notes(
    state: &AppState,
    user_id: i64,
    mut builder: QueryBuilder<'_, Sqlite>,
) -> Result<Vec<Note>> {
    let mut conn = state.db.acquire().await?;
    let mut notes = builder
        .build_query_as::<Note>()
        .fetch_all(&mut *conn)
        .await?;
    attach_relations(&mut conn, user_id, &mut notes).await?;
    Ok(notes)
}

/// List notes, pinned first then most recently updated
pub async fn list_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<NoteListQuery>,
) -> Result<Json<NotesResponse>> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM notes WHERE user_id = ");
    builder.push_bind(auth.user_id);

    if let Some(archived) = query.archived {
        builder.push(" AND is_archived = ").push_bind(archived);
    }
    if let Some(pinned) = query.pinned {
        builder.push(" AND is_pinned = ").push_bind(pinned);
    }
    if let Some(category_id) = query.category_id {
        builder.push(" AND category_id = ").push_bind(category_id);
    }
    builder.push(" ORDER BY is_pinned DESC, updated_at DESC");

    let notes = load_notes(&state, auth.user_id, builder).await?;
    Ok(Json(NotesResponse { notes }))
}

pub async fn get_note(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Note>> {
    let mut conn = state.db.acquire().await?;
    Ok(Json(fetch_note(&mut conn, auth.user_id, id).await?))
}

/// Create a note, its tag links and a `created` history row in one transaction
pub async fn create_note(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<CreateNote>,
) -> Result<(StatusCode, Json<Note>)> {
    let mut tx = state.db.begin().await?;
    ensure_category_owned(&mut tx, auth.user_id, payload.category_id).await?;

    let now = Utc::now();
    let note = sqlx::query_as::<_, Note>(
        "INSERT INTO notes (title, content, color, is_encrypted, is_pinned, is_archived,
             is_favorite, is_markdown, position, category_id, user_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(&payload.title)
    .bind(&payload.content)
    .bind(payload.color.as_deref().unwrap_or(DEFAULT_NOTE_COLOR))
    .bind(payload.is_encrypted)
    .bind(payload.is_pinned)
    .bind(payload.is_archived)
    .bind(payload.is_favorite)
    .bind(payload.is_markdown)
    .bind(payload.position)
    .bind(payload.category_id)
    .bind(auth.user_id)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    if !payload.tag_ids.is_empty() {
        replace_tags(&mut tx, auth.user_id, note.id, &payload.tag_ids).await?;
    }
    record_history(&mut tx, &note, HistoryAction::Created).await?;

    let note = fetch_note(&mut tx, auth.user_id, note.id).await?;
    tx.commit().await?;

    tracing::info!("User {} created note {}", auth.user_id, note.id);
    Ok((StatusCode::CREATED, Json(note)))
}

/// Apply a typed patch; history is written only when title or content changed
pub async fn update_note(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<NotePatch>,
) -> Result<Json<Note>> {
    let mut tx = state.db.begin().await?;
    let mut note = fetch_note(&mut tx, auth.user_id, id).await?;

    if let Some(category_id) = patch.category_id {
        ensure_category_owned(&mut tx, auth.user_id, category_id).await?;
    }

    let content_changed = patch.apply(&mut note);
    note.updated_at = Utc::now();
    update_note_row(&mut tx, &note).await?;

    if let Some(tag_ids) = &patch.tag_ids {
        replace_tags(&mut tx, auth.user_id, note.id, tag_ids).await?;
    }
    if content_changed {
        record_history(&mut tx, &note, HistoryAction::Updated).await?;
    }

    let note = fetch_note(&mut tx, auth.user_id, id).await?;
    tx.commit().await?;

    Ok(Json(note))
}

/// Log a `deleted` snapshot, then remove the note
pub async fn delete_note(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>> {
    let mut tx = state.db.begin().await?;
    let note = fetch_note(&mut tx, auth.user_id, id).await?;

    record_history(&mut tx, &note, HistoryAction::Deleted).await?;
    sqlx::query("DELETE FROM notes WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(auth.user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!("User {} deleted note {}", auth.user_id, id);
    Ok(MessageResponse::json("Note deleted"))
}

/// History is kept after the note is gone, so this does not require the note to exist
pub async fn note_history(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<HistoryResponse>> {
    let history = sqlx::query_as::<_, NoteHistory>(
        "SELECT * FROM note_history WHERE note_id = ? AND user_id = ?
         ORDER BY created_at DESC, id DESC",
    )
    .bind(id)
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(HistoryResponse { history }))
}

fn push_text_filter(builder: &mut QueryBuilder<'_, Sqlite>, text: &str) {
    let pattern = format!("%{}%", text);
    builder
        .push(" AND (title LIKE ")
        .push_bind(pattern.clone())
        .push(" OR content LIKE ")
        .push_bind(pattern)
        .push(")");
}

/// Substring search over title and content
pub async fn search_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    if query.q.trim().is_empty() {
        return Err(AppError::InvalidInput("Search query must not be empty".to_string()));
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM notes WHERE user_id = ");
    builder.push_bind(auth.user_id);
    push_text_filter(&mut builder, &query.q);
    builder.push(" ORDER BY updated_at DESC");

    let notes = load_notes(&state, auth.user_id, builder).await?;
    Ok(Json(SearchResponse {
        notes,
        query: query.q,
    }))
}

/// Structured search; the tag filter runs over the loaded result
pub async fn advanced_search(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(search): ApiJson<AdvancedSearch>,
) -> Result<Json<AdvancedSearchResponse>> {
    let date_from = match search.date_from.trim() {
        "" => None,
        raw => Some(start_of_day(parse_date(raw)?)),
    };
    let date_to = match search.date_to.trim() {
        "" => None,
        raw => Some(start_of_day(parse_date(raw)?) + Duration::days(1)),
    };

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM notes WHERE user_id = ");
    builder.push_bind(auth.user_id);

    if !search.query.is_empty() {
        push_text_filter(&mut builder, &search.query);
    }
    if let Some(category_id) = search.category_id {
        builder.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(archived) = search.is_archived {
        builder.push(" AND is_archived = ").push_bind(archived);
    }
    if let Some(from) = date_from {
        builder.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = date_to {
        builder.push(" AND created_at < ").push_bind(to);
    }
    builder.push(" ORDER BY updated_at DESC");

    let mut notes = load_notes(&state, auth.user_id, builder).await?;
    if !search.tag_ids.is_empty() {
        notes.retain(|note| note.has_any_tag(&search.tag_ids));
    }

    Ok(Json(AdvancedSearchResponse {
        total: notes.len(),
        notes,
    }))
}

/// Render notes as the plain-text export document
pub fn render_text_export(notes: &[Note]) -> String {
    let mut out = String::from("NOTES EXPORT\n============\n\n");

    for note in notes {
        out.push_str(&format!("TITLE: {}\n", note.title));
        out.push_str(&format!(
            "CREATED: {}\n",
            note.created_at.format("%Y-%m-%d %H:%M:%S")
        ));
        if let Some(category) = &note.category {
            out.push_str(&format!("CATEGORY: {}\n", category.name));
        }
        if !note.tags.is_empty() {
            let names: Vec<&str> = note.tags.iter().map(|t| t.name.as_str()).collect();
            out.push_str(&format!("TAGS: {}\n", names.join(", ")));
        }
        out.push_str(&format!("CONTENT:\n{}\n\n", note.content));
        out.push_str("---\n\n");
    }

    out
}

/// Export every note, newest first, as JSON or plain text
pub async fn export_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ExportQuery>,
) -> Result<Response> {
    let format = query.format.as_deref().unwrap_or("json");
    if format != "json" && format != "txt" {
        return Err(AppError::InvalidInput(format!(
            "Unsupported export format '{}', expected json or txt",
            format
        )));
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM notes WHERE user_id = ");
    builder.push_bind(auth.user_id);
    builder.push(" ORDER BY created_at DESC, id DESC");
    let notes = load_notes(&state, auth.user_id, builder).await?;

    tracing::info!("User {} exported {} notes as {}", auth.user_id, notes.len(), format);

    let response = if format == "txt" {
        (
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=notes.txt"),
            ],
            render_text_export(&notes),
        )
            .into_response()
    } else {
        (
            [(header::CONTENT_DISPOSITION, "attachment; filename=notes.json")],
            Json(json!({ "notes": notes, "exported_at": Utc::now() })),
        )
            .into_response()
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Tag};
    use chrono::TimeZone;

    #[test]
    fn test_render_text_export() {
        let created = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let note = Note {
            id: 1,
            title: "Hi".to_string(),
            content: "World".to_string(),
            color: DEFAULT_NOTE_COLOR.to_string(),
            is_encrypted: false,
            is_pinned: false,
            is_archived: false,
            is_favorite: false,
            is_markdown: false,
            position: 0,
            category_id: Some(2),
            user_id: 1,
            created_at: created,
            updated_at: created,
            category: Some(Category {
                id: 2,
                name: "Work".to_string(),
                color: String::new(),
                icon: String::new(),
                user_id: 1,
                created_at: created,
                updated_at: created,
            }),
            tags: vec![
                Tag {
                    id: 1,
                    name: "a".to_string(),
                    color: String::new(),
                    user_id: 1,
                    created_at: created,
                },
                Tag {
                    id: 2,
                    name: "b".to_string(),
                    color: String::new(),
                    user_id: 1,
                    created_at: created,
                },
            ],
        };

        let text = render_text_export(&[note]);
        assert!(text.starts_with("NOTES EXPORT\n"));
        assert!(text.contains(
            "TITLE: Hi\nCREATED: 2025-01-02 03:04:05\nCATEGORY: Work\nTAGS: a, b\nCONTENT:\nWorld\n\n---\n\n"
        ));
    }

    #[test]
    fn test_render_text_export_without_labels() {
        let now = Utc::now();
        let note = Note {
            id: 1,
            title: "Plain".to_string(),
            content: String::new(),
            color: DEFAULT_NOTE_COLOR.to_string(),
            is_encrypted: false,
            is_pinned: false,
            is_archived: false,
            is_favorite: false,
            is_markdown: false,
            position: 0,
            category_id: None,
            user_id: 1,
            created_at: now,
            updated_at: now,
            category: None,
            tags: Vec::new(),
        };

        let text = render_text_export(&[note]);
        assert!(!text.contains("CATEGORY:"));
        assert!(!text.contains("TAGS:"));
        assert_eq!(text.matches("---").count(), 1);
    }
}
