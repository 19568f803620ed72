use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite};

use crate::auth::AuthUser;
use crate::constants::{ERR_GRAPH_STATE_NOT_FOUND, GRAPH_LAYOUTS};
use crate::db::notes::attach_relations;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::graph::{assemble, GraphSource};
use crate::models::graph::{GraphQuery, GraphStateInput};
use crate::models::{Category, GraphData, GraphState, Link, Note, Tag};
use crate::routes::validation::{require_non_empty, require_one_of};
use crate::routes::MessageResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct GraphStatesResponse {
    pub states: Vec<GraphState>,
}

/// Node/edge projection of the caller's notes, categories, tags and links
pub async fn get_graph(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<GraphQuery>,
) -> Result<Json<GraphData>> {
    let mut conn = state.db.acquire().await?;

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM notes WHERE user_id = ");
    builder.push_bind(auth.user_id);
    if let Some(category_id) = query.category {
        builder.push(" AND category_id = ").push_bind(category_id);
    }
    builder.push(" ORDER BY id");
    let mut notes = builder
        .build_query_as::<Note>()
        .fetch_all(&mut *conn)
        .await?;
    attach_relations(&mut conn, auth.user_id, &mut notes).await?;

    let links = sqlx::query_as::<_, Link>("SELECT * FROM links WHERE user_id = ? ORDER BY id")
        .bind(auth.user_id)
        .fetch_all(&mut *conn)
        .await?;
    let categories =
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE user_id = ? ORDER BY id")
            .bind(auth.user_id)
            .fetch_all(&mut *conn)
            .await?;
    let tags = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE user_id = ? ORDER BY id")
        .bind(auth.user_id)
        .fetch_all(&mut *conn)
        .await?;

    let source = GraphSource {
        notes: &notes,
        categories: &categories,
        tags: &tags,
        links: &links,
    };

    Ok(Json(assemble(&source, &query)))
}

/// Upsert a named state: overwrite (200) when the name exists, otherwise create (201)
pub async fn save_graph_state(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<GraphStateInput>,
) -> Result<(StatusCode, Json<GraphState>)> {
    require_non_empty("name", &input.name)?;
    let layout = input.layout.as_deref().unwrap_or("force");
    require_one_of("layout", layout, GRAPH_LAYOUTS)?;

    let now = Utc::now();
    let updated = sqlx::query_as::<_, GraphState>(
        "UPDATE graph_states SET data = ?, layout = ?, zoom = ?, pan_x = ?, pan_y = ?, filter = ?,
             updated_at = ?
         WHERE user_id = ? AND name = ?
         RETURNING *",
    )
    .bind(&input.data)
    .bind(layout)
    .bind(input.zoom)
    .bind(input.pan_x)
    .bind(input.pan_y)
    .bind(&input.filter)
    .bind(now)
    .bind(auth.user_id)
    .bind(&input.name)
    .fetch_optional(&state.db)
    .await?;

    if let Some(graph_state) = updated {
        return Ok((StatusCode::OK, Json(graph_state)));
    }

    let created = sqlx::query_as::<_, GraphState>(
        "INSERT INTO graph_states (name, data, layout, zoom, pan_x, pan_y, filter, user_id,
             created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(&input.name)
    .bind(&input.data)
    .bind(layout)
    .bind(input.zoom)
    .bind(input.pan_x)
    .bind(input.pan_y)
    .bind(&input.filter)
    .bind(auth.user_id)
    .bind(now)
    .bind(now)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_graph_states(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<GraphStatesResponse>> {
    let states = sqlx::query_as::<_, GraphState>(
        "SELECT * FROM graph_states WHERE user_id = ? ORDER BY updated_at DESC, id DESC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(GraphStatesResponse { states }))
}

pub async fn get_graph_state(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<GraphState>> {
    let graph_state =
        sqlx::query_as::<_, GraphState>("SELECT * FROM graph_states WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(auth.user_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or(AppError::NotFound(ERR_GRAPH_STATE_NOT_FOUND))?;

    Ok(Json(graph_state))
}

pub async fn delete_graph_state(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>> {
    let result = sqlx::query("DELETE FROM graph_states WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(auth.user_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(ERR_GRAPH_STATE_NOT_FOUND));
    }

    Ok(MessageResponse::json("Graph state deleted"))
}
