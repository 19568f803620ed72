use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::constants::{ERR_LINK_NOT_FOUND, LINK_TYPES};
use crate::db::notes::ensure_note_owned;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::models::graph::{Backlink, CreateLink};
use crate::models::Link;
use crate::routes::validation::require_one_of;
use crate::routes::MessageResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct BacklinksResponse {
    pub backlinks: Vec<Backlink>,
}

/// Link two of the caller's notes
pub async fn create_link(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<CreateLink>,
) -> Result<(StatusCode, Json<Link>)> {
    let link_type = input.link_type.as_deref().unwrap_or("reference");
    require_one_of("link_type", link_type, LINK_TYPES)?;

    let mut conn = state.db.acquire().await?;
    ensure_note_owned(&mut conn, auth.user_id, input.from_note_id).await?;
    ensure_note_owned(&mut conn, auth.user_id, input.to_note_id).await?;

    let link = sqlx::query_as::<_, Link>(
        "INSERT INTO links (from_note_id, to_note_id, link_text, link_type, user_id, created_at)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(input.from_note_id)
    .bind(input.to_note_id)
    .bind(&input.link_text)
    .bind(link_type)
    .bind(auth.user_id)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn delete_link(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>> {
    let result = sqlx::query("DELETE FROM links WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(auth.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(ERR_LINK_NOT_FOUND));
    }

    Ok(MessageResponse::json("Link deleted"))
}

/// Links pointing at the given note, each with its source note's title
pub async fn get_backlinks(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(note_id): ApiPath<i64>,
) -> Result<Json<BacklinksResponse>> {
    let backlinks = sqlx::query_as::<_, Backlink>(
        "SELECT l.*, n.title AS from_note_title
         FROM links l
         JOIN notes n ON n.id = l.from_note_id
         WHERE l.user_id = ? AND l.to_note_id = ?
         ORDER BY l.created_at DESC, l.id DESC",
    )
    .bind(auth.user_id)
    .bind(note_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(BacklinksResponse { backlinks }))
}
