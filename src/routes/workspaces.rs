use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::constants::ERR_WORKSPACE_NOT_FOUND;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::models::workspace::WorkspaceInput;
use crate::models::Workspace;
use crate::routes::validation::require_non_empty;
use crate::routes::MessageResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct WorkspacesResponse {
    pub workspaces: Vec<Workspace>,
}

pub async fn list_workspaces(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<WorkspacesResponse>> {
    let workspaces =
        sqlx::query_as::<_, Workspace>("SELECT * FROM workspaces WHERE user_id = ? ORDER BY name, id")
            .bind(auth.user_id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(WorkspacesResponse { workspaces }))
}

/// New workspaces start inactive
pub async fn create_workspace(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<WorkspaceInput>,
) -> Result<(StatusCode, Json<Workspace>)> {
    require_non_empty("name", &input.name)?;
    let now = Utc::now();

    let workspace = sqlx::query_as::<_, Workspace>(
        "INSERT INTO workspaces (name, layout, is_active, user_id, created_at, updated_at)
         VALUES (?, ?, 0, ?, ?, ?)
         RETURNING *",
    )
    .bind(input.name.trim())
    .bind(&input.layout)
    .bind(auth.user_id)
    .bind(now)
    .bind(now)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(workspace)))
}

/// Make one workspace the only active one, atomically
pub async fn activate_workspace(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>> {
    let mut tx = state.db.begin().await?;

    let owned: Option<i64> =
        sqlx::query_scalar("SELECT id FROM workspaces WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(auth.user_id)
            .fetch_optional(&mut *tx)
            .await?;
    if owned.is_none() {
        return Err(AppError::NotFound(ERR_WORKSPACE_NOT_FOUND));
    }

    let now = Utc::now();
    sqlx::query("UPDATE workspaces SET is_active = 0, updated_at = ? WHERE user_id = ? AND is_active = 1")
        .bind(now)
        .bind(auth.user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE workspaces SET is_active = 1, updated_at = ? WHERE id = ? AND user_id = ?")
        .bind(now)
        .bind(id)
        .bind(auth.user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(MessageResponse::json("Workspace activated"))
}

pub async fn delete_workspace(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>> {
    let result = sqlx::query("DELETE FROM workspaces WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(auth.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(ERR_WORKSPACE_NOT_FOUND));
    }

    Ok(MessageResponse::json("Workspace deleted"))
}
