use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::constants::{ERR_SHARE_NOT_FOUND, SHARE_PERMISSIONS};
use crate::db::notes::{ensure_note_owned, fetch_note};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::models::share::{CreateShare, CreateShareResponse, SharedNoteResponse};
use crate::models::Share;
use crate::routes::validation::require_one_of;
use crate::routes::MessageResponse;
use crate::security::generate_share_token;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SharesResponse {
    pub shares: Vec<Share>,
}

/// Issue a capability token for one of the caller's notes
pub async fn create_share(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(note_id): ApiPath<i64>,
    ApiJson(input): ApiJson<CreateShare>,
) -> Result<(StatusCode, Json<CreateShareResponse>)> {
    require_one_of("permission", &input.permission, SHARE_PERMISSIONS)?;

    let mut conn = state.db.acquire().await?;
    ensure_note_owned(&mut conn, auth.user_id, note_id).await?;

    let now = Utc::now();
    let share = sqlx::query_as::<_, Share>(
        "INSERT INTO shares (share_token, permission, expires_at, is_active, note_id, owner_id,
             shared_with, created_at, updated_at)
         VALUES (?, ?, ?, 1, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(generate_share_token())
    .bind(&input.permission)
    .bind(input.expires_at)
    .bind(note_id)
    .bind(auth.user_id)
    .bind(&input.shared_with)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    tracing::info!("User {} shared note {} ({})", auth.user_id, note_id, share.permission);

    Ok((
        StatusCode::CREATED,
        Json(CreateShareResponse {
            share_token: share.share_token.clone(),
            share,
        }),
    ))
}

/// Redeem a share token without authentication
///
/// Inactive or unknown tokens are "invalid" (404); the expiry check only runs
/// for active shares and yields "expired" (403).
pub async fn get_shared_note(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
) -> Result<Json<SharedNoteResponse>> {
    let mut conn = state.db.acquire().await?;

    let share = sqlx::query_as::<_, Share>(
        "SELECT * FROM shares WHERE share_token = ? AND is_active = 1",
    )
    .bind(&token)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::ShareInvalid)?;

    if share.is_expired(Utc::now()) {
        return Err(AppError::ShareExpired);
    }

    let note = fetch_note(&mut conn, share.owner_id, share.note_id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::ShareInvalid,
            other => other,
        })?;

    Ok(Json(SharedNoteResponse {
        note,
        permission: share.permission,
    }))
}

pub async fn list_shares(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<SharesResponse>> {
    let shares = sqlx::query_as::<_, Share>(
        "SELECT * FROM shares WHERE owner_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(SharesResponse { shares }))
}

/// Deactivate a share; the row is kept and the token stops resolving
pub async fn deactivate_share(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>> {
    let result = sqlx::query(
        "UPDATE shares SET is_active = 0, updated_at = ? WHERE id = ? AND owner_id = ?",
    )
    .bind(Utc::now())
    .bind(id)
    .bind(auth.user_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(ERR_SHARE_NOT_FOUND));
    }

    Ok(MessageResponse::json("Share deactivated"))
}
