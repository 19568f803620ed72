use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json as SqlJson;

use crate::auth::AuthUser;
use crate::constants::{ERR_CANVAS_NODE_NOT_FOUND, ERR_CANVAS_NOT_FOUND};
use crate::db::canvas::{
    fetch_canvas, insert_connections, insert_node, load_detail, replace_nodes, update_canvas_row,
    validate_node,
};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::models::canvas::{
    CanvasDetail, CanvasNodeInput, CanvasNodePatch, CanvasPatch, CreateCanvas, SaveCanvasState,
    Viewport,
};
use crate::models::{Canvas, CanvasNode};
use crate::routes::validation::require_non_empty;
use crate::routes::MessageResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CanvasesResponse {
    pub canvases: Vec<Canvas>,
}

pub async fn list_canvases(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<CanvasesResponse>> {
    let canvases = sqlx::query_as::<_, Canvas>(
        "SELECT * FROM canvases WHERE user_id = ? ORDER BY updated_at DESC, id DESC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(CanvasesResponse { canvases }))
}

pub async fn create_canvas(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<CreateCanvas>,
) -> Result<(StatusCode, Json<Canvas>)> {
    require_non_empty("name", &input.name)?;
    let now = Utc::now();

    let canvas = sqlx::query_as::<_, Canvas>(
        "INSERT INTO canvases (name, data, width, height, zoom, pan_x, pan_y, view_state, user_id,
             created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(input.name.trim())
    .bind(SqlJson(input.data.unwrap_or(Value::Null)))
    .bind(input.width)
    .bind(input.height)
    .bind(input.zoom)
    .bind(input.pan_x)
    .bind(input.pan_y)
    .bind(&input.view_state)
    .bind(auth.user_id)
    .bind(now)
    .bind(now)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(canvas)))
}

/// Canvas with nodes (z-index order) and connections
pub async fn get_canvas(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<CanvasDetail>> {
    let mut conn = state.db.acquire().await?;
    let canvas = fetch_canvas(&mut conn, auth.user_id, id).await?;
    Ok(Json(load_detail(&mut conn, canvas).await?))
}

/// Patch canvas fields; a `nodes` array replaces the node set in the same transaction
pub async fn update_canvas(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<CanvasPatch>,
) -> Result<Json<CanvasDetail>> {
    let mut tx = state.db.begin().await?;
    let mut canvas = fetch_canvas(&mut tx, auth.user_id, id).await?;

    if let Some(name) = &patch.name {
        require_non_empty("name", name)?;
    }
    patch.apply(&mut canvas);
    update_canvas_row(&mut tx, &canvas).await?;

    if let Some(nodes) = &patch.nodes {
        replace_nodes(&mut tx, auth.user_id, canvas.id, nodes).await?;
    }

    let canvas = fetch_canvas(&mut tx, auth.user_id, id).await?;
    let detail = load_detail(&mut tx, canvas).await?;
    tx.commit().await?;

    Ok(Json(detail))
}

pub async fn delete_canvas(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>> {
    let result = sqlx::query("DELETE FROM canvases WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(auth.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(ERR_CANVAS_NOT_FOUND));
    }

    Ok(MessageResponse::json("Canvas deleted"))
}

/// Destructive full replace of viewport, payload, nodes and connections
///
/// Connections name nodes by position in this request's `nodes` array. Any
/// failure rolls the whole save back.
pub async fn save_canvas_state(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<SaveCanvasState>,
) -> Result<Json<MessageResponse>> {
    let mut tx = state.db.begin().await?;
    let mut canvas = fetch_canvas(&mut tx, auth.user_id, id).await?;

    payload.viewport().apply(&mut canvas);
    if let Some(data) = &payload.data {
        canvas.data = SqlJson(data.clone());
    }
    update_canvas_row(&mut tx, &canvas).await?;

    let node_ids = replace_nodes(&mut tx, auth.user_id, canvas.id, &payload.nodes).await?;
    insert_connections(
        &mut tx,
        auth.user_id,
        canvas.id,
        &node_ids,
        &payload.connections,
    )
    .await?;

    tx.commit().await?;

    tracing::debug!(
        "Canvas {} saved: {} nodes, {} connections",
        canvas.id,
        payload.nodes.len(),
        payload.connections.len()
    );

    Ok(MessageResponse::json("Canvas state saved"))
}

/// Persist viewport scalars only
pub async fn autosave_canvas(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(viewport): ApiJson<Viewport>,
) -> Result<Json<MessageResponse>> {
    let result = sqlx::query(
        "UPDATE canvases SET zoom = COALESCE(?, zoom), pan_x = COALESCE(?, pan_x),
             pan_y = COALESCE(?, pan_y), view_state = COALESCE(?, view_state), updated_at = ?
         WHERE id = ? AND user_id = ?",
    )
    .bind(viewport.zoom)
    .bind(viewport.pan_x)
    .bind(viewport.pan_y)
    .bind(viewport.view_state.as_deref())
    .bind(Utc::now())
    .bind(id)
    .bind(auth.user_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(ERR_CANVAS_NOT_FOUND));
    }

    Ok(MessageResponse::json("Canvas autosaved"))
}

// =============================================================================
// Single nodes
// =============================================================================

pub async fn create_node(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(canvas_id): ApiPath<i64>,
    ApiJson(input): ApiJson<CanvasNodeInput>,
) -> Result<(StatusCode, Json<CanvasNode>)> {
    let mut conn = state.db.acquire().await?;
    fetch_canvas(&mut conn, auth.user_id, canvas_id).await?;

    let node = insert_node(&mut conn, auth.user_id, canvas_id, &input).await?;
    Ok((StatusCode::CREATED, Json(node)))
}

async fn fetch_node(
    conn: &mut sqlx::SqliteConnection,
    user_id: i64,
    canvas_id: i64,
    node_id: i64,
) -> Result<CanvasNode> {
    sqlx::query_as::<_, CanvasNode>(
        "SELECT * FROM canvas_nodes WHERE id = ? AND canvas_id = ? AND user_id = ?",
    )
    .bind(node_id)
    .bind(canvas_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::NotFound(ERR_CANVAS_NODE_NOT_FOUND))
}

pub async fn update_node(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((canvas_id, node_id)): ApiPath<(i64, i64)>,
    ApiJson(patch): ApiJson<CanvasNodePatch>,
) -> Result<Json<CanvasNode>> {
    let mut conn = state.db.acquire().await?;
    let mut node = fetch_node(&mut conn, auth.user_id, canvas_id, node_id).await?;

    patch.apply(&mut node);
    validate_node(&mut conn, auth.user_id, &node.node_type, node.note_id).await?;

    let node = sqlx::query_as::<_, CanvasNode>(
        "UPDATE canvas_nodes SET type = ?, x = ?, y = ?, width = ?, height = ?, rotation = ?,
             scale = ?, z_index = ?, title = ?, content = ?, color = ?, note_id = ?, updated_at = ?
         WHERE id = ? AND user_id = ?
         RETURNING *",
    )
    .bind(&node.node_type)
    .bind(node.x)
    .bind(node.y)
    .bind(node.width)
    .bind(node.height)
    .bind(node.rotation)
    .bind(node.scale)
    .bind(node.z_index)
    .bind(&node.title)
    .bind(&node.content)
    .bind(&node.color)
    .bind(node.note_id)
    .bind(Utc::now())
    .bind(node.id)
    .bind(auth.user_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Json(node))
}

pub async fn delete_node(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath((canvas_id, node_id)): ApiPath<(i64, i64)>,
) -> Result<Json<MessageResponse>> {
    let result =
        sqlx::query("DELETE FROM canvas_nodes WHERE id = ? AND canvas_id = ? AND user_id = ?")
            .bind(node_id)
            .bind(canvas_id)
            .bind(auth.user_id)
            .execute(&state.db)
            .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(ERR_CANVAS_NODE_NOT_FOUND));
    }

    Ok(MessageResponse::json("Canvas node deleted"))
}
