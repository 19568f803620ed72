use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::constants::BLOCK_TYPES;
use crate::db::notes::ensure_note_owned;
use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::models::note::BlockInput;
use crate::models::Block;
use crate::routes::validation::require_one_of;
use crate::security::generate_block_id;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct BlocksResponse {
    pub blocks: Vec<Block>,
}

pub async fn get_blocks(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(note_id): ApiPath<i64>,
) -> Result<Json<BlocksResponse>> {
    let mut conn = state.db.acquire().await?;
    ensure_note_owned(&mut conn, auth.user_id, note_id).await?;

    let blocks = sqlx::query_as::<_, Block>(
        "SELECT * FROM blocks WHERE note_id = ? AND user_id = ? ORDER BY position",
    )
    .bind(note_id)
    .bind(auth.user_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Json(BlocksResponse { blocks }))
}

/// Replace the note's blocks with the body array, positions following its order
///
/// Supplied block ids are kept and missing ones generated; an id already used
/// by another note fails the whole replacement with 409.
pub async fn update_blocks(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(note_id): ApiPath<i64>,
    ApiJson(inputs): ApiJson<Vec<BlockInput>>,
) -> Result<Json<BlocksResponse>> {
    for block in &inputs {
        if let Some(block_type) = &block.block_type {
            require_one_of("type", block_type, BLOCK_TYPES)?;
        }
    }

    let mut tx = state.db.begin().await?;
    ensure_note_owned(&mut tx, auth.user_id, note_id).await?;

    sqlx::query("DELETE FROM blocks WHERE note_id = ? AND user_id = ?")
        .bind(note_id)
        .bind(auth.user_id)
        .execute(&mut *tx)
        .await?;

    let now = Utc::now();
    let mut blocks = Vec::with_capacity(inputs.len());
    for (position, input) in inputs.iter().enumerate() {
        let block_id = match &input.block_id {
            Some(id) if !id.trim().is_empty() => id.clone(),
            _ => generate_block_id(),
        };

        let block = sqlx::query_as::<_, Block>(
            "INSERT INTO blocks (block_id, content, type, level, position, note_id, user_id,
                 created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(block_id)
        .bind(&input.content)
        .bind(input.block_type.as_deref().unwrap_or("paragraph"))
        .bind(input.level)
        .bind(position as i64)
        .bind(note_id)
        .bind(auth.user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        blocks.push(block);
    }

    tx.commit().await?;
    Ok(Json(BlocksResponse { blocks }))
}
