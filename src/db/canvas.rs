//! Canvas persistence. Bulk node/connection replacement runs on a caller-owned
//! transaction so a failure anywhere leaves the previous board intact.

use chrono::Utc;
use sqlx::SqliteConnection;

use crate::constants::{CANVAS_NODE_TYPES, ERR_CANVAS_NOT_FOUND};
use crate::db::notes::ensure_note_owned;
use crate::error::{AppError, Result};
use crate::models::canvas::{CanvasDetail, CanvasNodeInput, ConnectionInput};
use crate::models::{Canvas, CanvasConnection, CanvasNode};
use crate::routes::validation::require_one_of;

pub async fn fetch_canvas(
    conn: &mut SqliteConnection,
    user_id: i64,
    canvas_id: i64,
) -> Result<Canvas> {
    sqlx::query_as::<_, Canvas>("SELECT * FROM canvases WHERE id = ? AND user_id = ?")
        .bind(canvas_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotFound(ERR_CANVAS_NOT_FOUND))
}

/// Canvas with nodes ordered by z-index then id, connections by id
pub async fn load_detail(conn: &mut SqliteConnection, canvas: Canvas) -> Result<CanvasDetail> {
    let nodes = sqlx::query_as::<_, CanvasNode>(
        "SELECT * FROM canvas_nodes WHERE canvas_id = ? ORDER BY z_index, id",
    )
    .bind(canvas.id)
    .fetch_all(&mut *conn)
    .await?;

    let connections = sqlx::query_as::<_, CanvasConnection>(
        "SELECT * FROM canvas_connections WHERE canvas_id = ? ORDER BY id",
    )
    .bind(canvas.id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(CanvasDetail {
        canvas,
        nodes,
        connections,
    })
}

/// Write the canvas scalars back to its row
pub async fn update_canvas_row(conn: &mut SqliteConnection, canvas: &Canvas) -> Result<()> {
    sqlx::query(
        "UPDATE canvases SET name = ?, data = ?, width = ?, height = ?, zoom = ?, pan_x = ?,
             pan_y = ?, view_state = ?, updated_at = ?
         WHERE id = ? AND user_id = ?",
    )
    .bind(&canvas.name)
    .bind(&canvas.data)
    .bind(canvas.width)
    .bind(canvas.height)
    .bind(canvas.zoom)
    .bind(canvas.pan_x)
    .bind(canvas.pan_y)
    .bind(&canvas.view_state)
    .bind(Utc::now())
    .bind(canvas.id)
    .bind(canvas.user_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Reject unknown node types and note links to notes the caller does not own
pub async fn validate_node(
    conn: &mut SqliteConnection,
    user_id: i64,
    node_type: &str,
    note_id: Option<i64>,
) -> Result<()> {
    require_one_of("type", node_type, CANVAS_NODE_TYPES)?;
    if let Some(note_id) = note_id {
        ensure_note_owned(conn, user_id, note_id).await?;
    }
    Ok(())
}

/// Insert one node and return it
pub async fn insert_node(
    conn: &mut SqliteConnection,
    user_id: i64,
    canvas_id: i64,
    node: &CanvasNodeInput,
) -> Result<CanvasNode> {
    validate_node(conn, user_id, &node.node_type, node.note_id).await?;

    let now = Utc::now();
    let created = sqlx::query_as::<_, CanvasNode>(
        "INSERT INTO canvas_nodes (canvas_id, type, x, y, width, height, rotation, scale, z_index,
             title, content, color, note_id, user_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(canvas_id)
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
    .bind(user_id)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(created)
}

/// Delete the canvas's nodes (connections cascade) and insert `nodes` in order
///
/// Returns the new row ids in payload order.
pub async fn replace_nodes(
    conn: &mut SqliteConnection,
    user_id: i64,
    canvas_id: i64,
    nodes: &[CanvasNodeInput],
) -> Result<Vec<i64>> {
    sqlx::query("DELETE FROM canvas_connections WHERE canvas_id = ?")
        .bind(canvas_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM canvas_nodes WHERE canvas_id = ?")
        .bind(canvas_id)
        .execute(&mut *conn)
        .await?;

    let mut ids = Vec::with_capacity(nodes.len());
    for node in nodes {
        ids.push(insert_node(conn, user_id, canvas_id, node).await?.id);
    }

    Ok(ids)
}

/// Insert connections whose endpoints are positions into `node_ids`
///
/// A position outside `node_ids` fails the whole call; the caller's
/// transaction then rolls back every node inserted alongside.
pub async fn insert_connections(
    conn: &mut SqliteConnection,
    user_id: i64,
    canvas_id: i64,
    node_ids: &[i64],
    connections: &[ConnectionInput],
) -> Result<()> {
    let now = Utc::now();

    for (i, connection) in connections.iter().enumerate() {
        let endpoint = |position: usize| {
            node_ids.get(position).copied().ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "connection {} references node {} but only {} nodes were supplied",
                    i,
                    position,
                    node_ids.len()
                ))
            })
        };
        let from_node_id = endpoint(connection.from_node)?;
        let to_node_id = endpoint(connection.to_node)?;

        sqlx::query(
            "INSERT INTO canvas_connections (canvas_id, from_node_id, to_node_id, type, user_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(canvas_id)
        .bind(from_node_id)
        .bind(to_node_id)
        .bind(connection.connection_type.as_deref().unwrap_or("connection"))
        .bind(user_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}
