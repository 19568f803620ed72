use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;

use super::double_option;

/// A visual board. `data` is an opaque client payload stored as JSON text.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Canvas {
    pub id: i64,
    pub name: String,
    pub data: Json<Value>,
    pub width: i64,
    pub height: i64,
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    pub view_state: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CanvasNode {
    pub id: i64,
    pub canvas_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub node_type: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub scale: f64,
    pub z_index: i64,
    pub title: String,
    pub content: String,
    pub color: String,
    pub note_id: Option<i64>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CanvasConnection {
    pub id: i64,
    pub canvas_id: i64,
    pub from_node_id: i64,
    pub to_node_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub connection_type: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Canvas with its full node and connection sets
#[derive(Debug, Serialize)]
pub struct CanvasDetail {
    #[serde(flatten)]
    pub canvas: Canvas,
    pub nodes: Vec<CanvasNode>,
    pub connections: Vec<CanvasConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCanvas {
    pub name: String,
    pub data: Option<Value>,
    #[serde(default = "default_width")]
    pub width: i64,
    #[serde(default = "default_height")]
    pub height: i64,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub pan_x: f64,
    #[serde(default)]
    pub pan_y: f64,
    #[serde(default)]
    pub view_state: String,
}

/// Mutable canvas fields. A `nodes` array replaces the whole node set.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanvasPatch {
    pub name: Option<String>,
    pub data: Option<Value>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub zoom: Option<f64>,
    pub pan_x: Option<f64>,
    pub pan_y: Option<f64>,
    pub view_state: Option<String>,
    pub nodes: Option<Vec<CanvasNodeInput>>,
}

impl CanvasPatch {
    pub fn apply(&self, canvas: &mut Canvas) {
        if let Some(name) = &self.name {
            canvas.name = name.clone();
        }
        if let Some(data) = &self.data {
            canvas.data = Json(data.clone());
        }
        if let Some(v) = self.width {
            canvas.width = v;
        }
        if let Some(v) = self.height {
            canvas.height = v;
        }
        Viewport {
            zoom: self.zoom,
            pan_x: self.pan_x,
            pan_y: self.pan_y,
            view_state: self.view_state.clone(),
        }
        .apply(canvas);
    }
}

/// A node as supplied by the client. Row-level keys such as `id` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CanvasNodeInput {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub z_index: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub color: String,
    pub note_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanvasNodePatch {
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub scale: Option<f64>,
    pub z_index: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub color: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub note_id: Option<Option<i64>>,
}

impl CanvasNodePatch {
    pub fn apply(&self, node: &mut CanvasNode) {
        if let Some(v) = &self.node_type {
            node.node_type = v.clone();
        }
        if let Some(v) = self.x {
            node.x = v;
        }
        if let Some(v) = self.y {
            node.y = v;
        }
        if let Some(v) = self.width {
            node.width = v;
        }
        if let Some(v) = self.height {
            node.height = v;
        }
        if let Some(v) = self.rotation {
            node.rotation = v;
        }
        if let Some(v) = self.scale {
            node.scale = v;
        }
        if let Some(v) = self.z_index {
            node.z_index = v;
        }
        if let Some(v) = &self.title {
            node.title = v.clone();
        }
        if let Some(v) = &self.content {
            node.content = v.clone();
        }
        if let Some(v) = &self.color {
            node.color = v.clone();
        }
        if let Some(v) = self.note_id {
            node.note_id = v;
        }
    }
}

/// Connection between two entries of the same payload's `nodes` array,
/// referenced by zero-based position
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionInput {
    pub from_node: usize,
    pub to_node: usize,
    #[serde(rename = "type")]
    pub connection_type: Option<String>,
}

/// Body of `POST /api/canvases/:id/save-state`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaveCanvasState {
    pub zoom: Option<f64>,
    pub pan_x: Option<f64>,
    pub pan_y: Option<f64>,
    pub view_state: Option<String>,
    pub data: Option<Value>,
    #[serde(default)]
    pub nodes: Vec<CanvasNodeInput>,
    #[serde(default)]
    pub connections: Vec<ConnectionInput>,
}

impl SaveCanvasState {
    pub fn viewport(&self) -> Viewport {
        Viewport {
            zoom: self.zoom,
            pan_x: self.pan_x,
            pan_y: self.pan_y,
            view_state: self.view_state.clone(),
        }
    }
}

/// Viewport scalars; also the body of `POST /api/canvases/:id/autosave`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Viewport {
    pub zoom: Option<f64>,
    pub pan_x: Option<f64>,
    pub pan_y: Option<f64>,
    pub view_state: Option<String>,
}

impl Viewport {
    pub fn apply(&self, canvas: &mut Canvas) {
        if let Some(v) = self.zoom {
            canvas.zoom = v;
        }
        if let Some(v) = self.pan_x {
            canvas.pan_x = v;
        }
        if let Some(v) = self.pan_y {
            canvas.pan_y = v;
        }
        if let Some(v) = &self.view_state {
            canvas.view_state = v.clone();
        }
    }
}

fn default_width() -> i64 {
    1920
}

fn default_height() -> i64 {
    1080
}

fn default_zoom() -> f64 {
    1.0
}

fn default_scale() -> f64 {
    1.0
}
