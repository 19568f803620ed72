use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::constants::{
    DEFAULT_CATEGORY_COLOR, DEFAULT_TAG_COLOR, ERR_CATEGORY_NOT_FOUND, ERR_TAG_NOT_FOUND,
};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::models::taxonomy::{CategoryInput, TagInput};
use crate::models::{Category, Tag};
use crate::routes::validation::require_non_empty;
use crate::routes::MessageResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

#[derive(Debug, Serialize)]
pub struct TagsResponse {
    pub tags: Vec<Tag>,
}

// =============================================================================
// Categories
// =============================================================================

pub async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<CategoriesResponse>> {
    let categories =
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE user_id = ? ORDER BY name, id")
            .bind(auth.user_id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(CategoriesResponse { categories }))
}

pub async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    require_non_empty("name", &input.name)?;
    let now = Utc::now();

    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, color, icon, user_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(input.name.trim())
    .bind(input.color.as_deref().unwrap_or(DEFAULT_CATEGORY_COLOR))
    .bind(input.icon.as_deref().unwrap_or_default())
    .bind(auth.user_id)
    .bind(now)
    .bind(now)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Replace name, color and icon; omitted color/icon keep their current value
pub async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<Json<Category>> {
    require_non_empty("name", &input.name)?;

    let category = sqlx::query_as::<_, Category>(
        "UPDATE categories
         SET name = ?, color = COALESCE(?, color), icon = COALESCE(?, icon), updated_at = ?
         WHERE id = ? AND user_id = ?
         RETURNING *",
    )
    .bind(input.name.trim())
    .bind(input.color.as_deref())
    .bind(input.icon.as_deref())
    .bind(Utc::now())
    .bind(id)
    .bind(auth.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound(ERR_CATEGORY_NOT_FOUND))?;

    Ok(Json(category))
}

/// Notes in the category keep existing with their category cleared
pub async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>> {
    let result = sqlx::query("DELETE FROM categories WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(auth.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(ERR_CATEGORY_NOT_FOUND));
    }

    Ok(MessageResponse::json("Category deleted"))
}

// =============================================================================
// Tags
// =============================================================================

pub async fn list_tags(State(state): State<AppState>, auth: AuthUser) -> Result<Json<TagsResponse>> {
    let tags = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE user_id = ? ORDER BY name, id")
        .bind(auth.user_id)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(TagsResponse { tags }))
}

pub async fn create_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<TagInput>,
) -> Result<(StatusCode, Json<Tag>)> {
    require_non_empty("name", &input.name)?;

    let tag = sqlx::query_as::<_, Tag>(
        "INSERT INTO tags (name, color, user_id, created_at) VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(input.name.trim())
    .bind(input.color.as_deref().unwrap_or(DEFAULT_TAG_COLOR))
    .bind(auth.user_id)
    .bind(Utc::now())
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn update_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<TagInput>,
) -> Result<Json<Tag>> {
    require_non_empty("name", &input.name)?;

    let tag = sqlx::query_as::<_, Tag>(
        "UPDATE tags SET name = ?, color = COALESCE(?, color)
         WHERE id = ? AND user_id = ?
         RETURNING *",
    )
    .bind(input.name.trim())
    .bind(input.color.as_deref())
    .bind(id)
    .bind(auth.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound(ERR_TAG_NOT_FOUND))?;

    Ok(Json(tag))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>> {
    let result = sqlx::query("DELETE FROM tags WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(auth.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(ERR_TAG_NOT_FOUND));
    }

    Ok(MessageResponse::json("Tag deleted"))
}
