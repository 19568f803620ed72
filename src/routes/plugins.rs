use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::constants::ERR_PLUGIN_NOT_FOUND;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::models::plugin::{HotkeyInput, PluginInput};
use crate::models::{Hotkey, Plugin};
use crate::routes::validation::require_non_empty;
use crate::routes::MessageResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PluginsResponse {
    pub plugins: Vec<Plugin>,
}

#[derive(Debug, Serialize)]
pub struct HotkeysResponse {
    pub hotkeys: Vec<Hotkey>,
}

// =============================================================================
// Plugins
// =============================================================================

/// Own plugins plus official ones, official first
pub async fn list_plugins(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PluginsResponse>> {
    let plugins = sqlx::query_as::<_, Plugin>(
        "SELECT * FROM plugins WHERE user_id = ? OR is_official = 1
         ORDER BY is_official DESC, name, id",
    )
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(PluginsResponse { plugins }))
}

/// User-authored plugins are never official and start disabled
pub async fn create_plugin(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<PluginInput>,
) -> Result<(StatusCode, Json<Plugin>)> {
    require_non_empty("name", &input.name)?;
    let now = Utc::now();

    let plugin = sqlx::query_as::<_, Plugin>(
        "INSERT INTO plugins (name, version, author, description, code, is_enabled, is_official,
             user_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, 0, 0, ?, ?, ?)
         RETURNING *",
    )
    .bind(input.name.trim())
    .bind(&input.version)
    .bind(&input.author)
    .bind(&input.description)
    .bind(&input.code)
    .bind(auth.user_id)
    .bind(now)
    .bind(now)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(plugin)))
}

pub async fn toggle_plugin(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Plugin>> {
    let plugin = sqlx::query_as::<_, Plugin>(
        "UPDATE plugins SET is_enabled = NOT is_enabled, updated_at = ?
         WHERE id = ? AND user_id = ?
         RETURNING *",
    )
    .bind(Utc::now())
    .bind(id)
    .bind(auth.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound(ERR_PLUGIN_NOT_FOUND))?;

    tracing::info!(
        "User {} {} plugin {}",
        auth.user_id,
        if plugin.is_enabled { "enabled" } else { "disabled" },
        plugin.id
    );

    Ok(Json(plugin))
}

pub async fn delete_plugin(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>> {
    let result = sqlx::query("DELETE FROM plugins WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(auth.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(ERR_PLUGIN_NOT_FOUND));
    }

    Ok(MessageResponse::json("Plugin deleted"))
}

// =============================================================================
// Hotkeys
// =============================================================================

pub async fn list_hotkeys(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<HotkeysResponse>> {
    let hotkeys = sqlx::query_as::<_, Hotkey>("SELECT * FROM hotkeys WHERE user_id = ? ORDER BY id")
        .bind(auth.user_id)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(HotkeysResponse { hotkeys }))
}

/// Replace the caller's whole hotkey set with the body array
pub async fn replace_hotkeys(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(inputs): ApiJson<Vec<HotkeyInput>>,
) -> Result<Json<HotkeysResponse>> {
    for input in &inputs {
        require_non_empty("command", &input.command)?;
        require_non_empty("key", &input.key)?;
    }

    let mut tx = state.db.begin().await?;
    sqlx::query("DELETE FROM hotkeys WHERE user_id = ?")
        .bind(auth.user_id)
        .execute(&mut *tx)
        .await?;

    let mut hotkeys = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let hotkey = sqlx::query_as::<_, Hotkey>(
            "INSERT INTO hotkeys (command, key, modifiers, description, user_id)
             VALUES (?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&input.command)
        .bind(&input.key)
        .bind(&input.modifiers)
        .bind(&input.description)
        .bind(auth.user_id)
        .fetch_one(&mut *tx)
        .await?;
        hotkeys.push(hotkey);
    }

    tx.commit().await?;
    Ok(Json(HotkeysResponse { hotkeys }))
}
