use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db::notes::attach_relations;
use crate::error::Result;
use crate::extract::ApiJson;
use crate::models::{Category, Note, Tag};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub last_sync: DateTime<Utc>,
    #[serde(default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub notes: Vec<Note>,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
    pub server_time: DateTime<Utc>,
}

/// Checkpoint-delta pull: rows changed strictly after `last_sync`
///
/// Notes and categories are matched on `updated_at`, tags on `created_at`.
/// Clients store `server_time` as their next checkpoint.
pub async fn sync(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<SyncRequest>,
) -> Result<Json<SyncResponse>> {
    let server_time = Utc::now();
    let mut conn = state.db.acquire().await?;

    let mut notes = sqlx::query_as::<_, Note>(
        "SELECT * FROM notes WHERE user_id = ? AND updated_at > ? ORDER BY updated_at",
    )
    .bind(auth.user_id)
    .bind(request.last_sync)
    .fetch_all(&mut *conn)
    .await?;
    attach_relations(&mut conn, auth.user_id, &mut notes).await?;

    let categories = sqlx::query_as::<_, Category>(
        "SELECT * FROM categories WHERE user_id = ? AND updated_at > ? ORDER BY updated_at",
    )
    .bind(auth.user_id)
    .bind(request.last_sync)
    .fetch_all(&mut *conn)
    .await?;

    let tags = sqlx::query_as::<_, Tag>(
        "SELECT * FROM tags WHERE user_id = ? AND created_at > ? ORDER BY created_at",
    )
    .bind(auth.user_id)
    .bind(request.last_sync)
    .fetch_all(&mut *conn)
    .await?;

    tracing::debug!(
        "Sync for user {} (device {:?}): {} notes, {} categories, {} tags",
        auth.user_id,
        request.device_id,
        notes.len(),
        categories.len(),
        tags.len()
    );

    Ok(Json(SyncResponse {
        notes,
        categories,
        tags,
        server_time,
    }))
}
