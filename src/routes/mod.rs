pub mod auth;
pub mod backup;
pub mod blocks;
pub mod canvas;
pub mod daily_note;
pub mod files;
pub mod graph;
pub mod health;
pub mod links;
pub mod markdown;
pub mod notes;
pub mod plugins;
pub mod reminders;
pub mod shares;
pub mod stats;
pub mod sync;
pub mod taxonomy;
pub mod templates;
pub mod validation;
pub mod workspaces;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub use health::health_check;

/// Multipart framing allowance on top of the raw file size limit
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Plain acknowledgement body: `{"message": "..."}`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn json(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// Build the full API router with request tracing
pub fn router(state: AppState) -> Router {
    let upload_limit = state
        .config
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health_check))
        // Accounts
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route(
            "/api/profile",
            get(auth::get_profile).put(auth::update_profile),
        )
        // Notes
        .route("/api/notes", get(notes::list_notes).post(notes::create_note))
        .route("/api/notes/search", get(notes::search_notes))
        .route("/api/notes/export", get(notes::export_notes))
        .route(
            "/api/notes/:id",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/api/notes/:id/history", get(notes::note_history))
        .route("/api/notes/:id/share", post(shares::create_share))
        .route(
            "/api/notes/:id/blocks",
            get(blocks::get_blocks).put(blocks::update_blocks),
        )
        .route("/api/search", post(notes::advanced_search))
        // Categories and tags
        .route(
            "/api/categories",
            get(taxonomy::list_categories).post(taxonomy::create_category),
        )
        .route(
            "/api/categories/:id",
            put(taxonomy::update_category).delete(taxonomy::delete_category),
        )
        .route(
            "/api/tags",
            get(taxonomy::list_tags).post(taxonomy::create_tag),
        )
        .route(
            "/api/tags/:id",
            put(taxonomy::update_tag).delete(taxonomy::delete_tag),
        )
        .route("/api/stats", get(stats::get_stats))
        // Templates and reminders
        .route(
            "/api/templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route(
            "/api/templates/:id",
            put(templates::update_template).delete(templates::delete_template),
        )
        .route(
            "/api/reminders",
            get(reminders::list_reminders).post(reminders::create_reminder),
        )
        .route(
            "/api/reminders/:id",
            put(reminders::update_reminder).delete(reminders::delete_reminder),
        )
        // Files
        .route(
            "/api/files/upload",
            post(files::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/files", get(files::list_files))
        .route("/api/files/:id", delete(files::delete_file))
        .route("/api/files/:id/download", get(files::download_file))
        // Shares: the same segment is a token on GET and a share id on DELETE
        .route("/api/shares", get(shares::list_shares))
        .route(
            "/api/shares/:key",
            get(shares::get_shared_note).delete(shares::deactivate_share),
        )
        // Backups and sync
        .route(
            "/api/backups",
            get(backup::list_backups).post(backup::create_backup),
        )
        .route("/api/backups/:id/download", get(backup::download_backup))
        .route("/api/sync", post(sync::sync))
        // Graph and links
        .route("/api/graph", get(graph::get_graph))
        .route("/api/graph/save-state", post(graph::save_graph_state))
        .route("/api/graph/states", get(graph::list_graph_states))
        .route(
            "/api/graph/states/:id",
            get(graph::get_graph_state).delete(graph::delete_graph_state),
        )
        .route("/api/links", post(links::create_link))
        .route("/api/links/:id", delete(links::delete_link))
        .route("/api/backlinks/:id", get(links::get_backlinks))
        // Canvas
        .route(
            "/api/canvases",
            get(canvas::list_canvases).post(canvas::create_canvas),
        )
        .route(
            "/api/canvases/:id",
            get(canvas::get_canvas)
                .put(canvas::update_canvas)
                .delete(canvas::delete_canvas),
        )
        .route("/api/canvases/:id/save-state", post(canvas::save_canvas_state))
        .route("/api/canvases/:id/autosave", post(canvas::autosave_canvas))
        .route("/api/canvases/:id/nodes", post(canvas::create_node))
        .route(
            "/api/canvases/:id/nodes/:node_id",
            put(canvas::update_node).delete(canvas::delete_node),
        )
        // Daily notes and workspaces
        .route("/api/daily-note", get(daily_note::get_daily_note))
        .route(
            "/api/workspaces",
            get(workspaces::list_workspaces).post(workspaces::create_workspace),
        )
        .route(
            "/api/workspaces/:id",
            delete(workspaces::delete_workspace),
        )
        .route(
            "/api/workspaces/:id/activate",
            put(workspaces::activate_workspace),
        )
        // Plugins, hotkeys and markdown
        .route(
            "/api/plugins",
            get(plugins::list_plugins).post(plugins::create_plugin),
        )
        .route("/api/plugins/:id", delete(plugins::delete_plugin))
        .route("/api/plugins/:id/toggle", put(plugins::toggle_plugin))
        .route(
            "/api/hotkeys",
            get(plugins::list_hotkeys).put(plugins::replace_hotkeys),
        )
        .route("/api/render-markdown", post(markdown::render_markdown))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
