use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::auth::AuthUser;
use crate::constants::{ERR_REMINDER_NOT_FOUND, REPEAT_TYPES};
use crate::db::notes::ensure_note_owned;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::reminder::{ReminderInput, ReminderQuery};
use crate::models::Reminder;
use crate::routes::validation::{require_non_empty, require_one_of};
use crate::routes::MessageResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RemindersResponse {
    pub reminders: Vec<Reminder>,
}

async fn validate(conn: &mut SqliteConnection, user_id: i64, input: &ReminderInput) -> Result<()> {
    require_non_empty("title", &input.title)?;
    if let Some(repeat_type) = &input.repeat_type {
        require_one_of("repeat_type", repeat_type, REPEAT_TYPES)?;
    }
    if let Some(note_id) = input.note_id {
        ensure_note_owned(conn, user_id, note_id).await?;
    }
    Ok(())
}

/// Reminders sorted by due time; `?active=true` keeps only active ones
pub async fn list_reminders(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ReminderQuery>,
) -> Result<Json<RemindersResponse>> {
    let only_active = query.active.unwrap_or(false);

    let reminders = sqlx::query_as::<_, Reminder>(
        "SELECT * FROM reminders WHERE user_id = ? AND (? = 0 OR is_active = 1)
         ORDER BY date_time, id",
    )
    .bind(auth.user_id)
    .bind(only_active)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(RemindersResponse { reminders }))
}

pub async fn create_reminder(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<ReminderInput>,
) -> Result<(StatusCode, Json<Reminder>)> {
    let mut conn = state.db.acquire().await?;
    validate(&mut conn, auth.user_id, &input).await?;
    let now = Utc::now();

    let reminder = sqlx::query_as::<_, Reminder>(
        "INSERT INTO reminders (title, date_time, is_active, is_repeat, repeat_type, note_id,
             user_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(input.title.trim())
    .bind(input.date_time)
    .bind(input.is_active)
    .bind(input.is_repeat)
    .bind(input.repeat_type.as_deref())
    .bind(input.note_id)
    .bind(auth.user_id)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok((StatusCode::CREATED, Json(reminder)))
}

pub async fn update_reminder(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ReminderInput>,
) -> Result<Json<Reminder>> {
    let mut conn = state.db.acquire().await?;
    validate(&mut conn, auth.user_id, &input).await?;

    let reminder = sqlx::query_as::<_, Reminder>(
        "UPDATE reminders SET title = ?, date_time = ?, is_active = ?, is_repeat = ?,
             repeat_type = ?, note_id = ?, updated_at = ?
         WHERE id = ? AND user_id = ?
         RETURNING *",
    )
    .bind(input.title.trim())
    .bind(input.date_time)
    .bind(input.is_active)
    .bind(input.is_repeat)
    .bind(input.repeat_type.as_deref())
    .bind(input.note_id)
    .bind(Utc::now())
    .bind(id)
    .bind(auth.user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::NotFound(ERR_REMINDER_NOT_FOUND))?;

    Ok(Json(reminder))
}

pub async fn delete_reminder(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>> {
    let result = sqlx::query("DELETE FROM reminders WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(auth.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(ERR_REMINDER_NOT_FOUND));
    }

    Ok(MessageResponse::json("Reminder deleted"))
}
