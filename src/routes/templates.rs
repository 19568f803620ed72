use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::constants::{DEFAULT_TEMPLATE_CATEGORY, ERR_TEMPLATE_NOT_FOUND};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::template::{TemplateInput, TemplateQuery};
use crate::models::Template;
use crate::routes::validation::require_non_empty;
use crate::routes::MessageResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<Template>,
}

/// The caller's own templates plus every public one
pub async fn list_templates(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<TemplateQuery>,
) -> Result<Json<TemplatesResponse>> {
    let templates = sqlx::query_as::<_, Template>(
        "SELECT * FROM templates
         WHERE (user_id = ? OR is_public = 1) AND (? IS NULL OR category = ?)
         ORDER BY name, id",
    )
    .bind(auth.user_id)
    .bind(query.category.as_deref())
    .bind(query.category.as_deref())
    .fetch_all(&state.db)
    .await?;

    Ok(Json(TemplatesResponse { templates }))
}

pub async fn create_template(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<TemplateInput>,
) -> Result<(StatusCode, Json<Template>)> {
    require_non_empty("name", &input.name)?;
    let now = Utc::now();

    let template = sqlx::query_as::<_, Template>(
        "INSERT INTO templates (name, content, category, is_public, user_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(input.name.trim())
    .bind(&input.content)
    .bind(input.category.as_deref().unwrap_or(DEFAULT_TEMPLATE_CATEGORY))
    .bind(input.is_public)
    .bind(auth.user_id)
    .bind(now)
    .bind(now)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(template)))
}

/// Only the owner may change a template, public or not
pub async fn update_template(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<TemplateInput>,
) -> Result<Json<Template>> {
    require_non_empty("name", &input.name)?;

    let template = sqlx::query_as::<_, Template>(
        "UPDATE templates SET name = ?, content = ?, category = ?, is_public = ?, updated_at = ?
         WHERE id = ? AND user_id = ?
         RETURNING *",
    )
    .bind(input.name.trim())
    .bind(&input.content)
    .bind(input.category.as_deref().unwrap_or(DEFAULT_TEMPLATE_CATEGORY))
    .bind(input.is_public)
    .bind(Utc::now())
    .bind(id)
    .bind(auth.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound(ERR_TEMPLATE_NOT_FOUND))?;

    Ok(Json(template))
}

pub async fn delete_template(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>> {
    let result = sqlx::query("DELETE FROM templates WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(auth.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(ERR_TEMPLATE_NOT_FOUND));
    }

    Ok(MessageResponse::json("Template deleted"))
}
