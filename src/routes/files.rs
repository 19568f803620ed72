use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::auth::AuthUser;
use crate::constants::{DEFAULT_MIME_TYPE, ERR_FILE_NOT_FOUND};
use crate::db::notes::ensure_note_owned;
use crate::error::{AppError, Result};
use crate::extract::{ApiPath, ApiQuery};
use crate::models::file::{sanitize_file_name, stored_file_name, FileQuery};
use crate::models::FileRecord;
use crate::routes::MessageResponse;
use crate::security::generate_blob_suffix;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct FilesResponse {
    pub files: Vec<FileRecord>,
}

struct Upload {
    name: String,
    mime_type: String,
    data: Vec<u8>,
}

/// Write `data` to a path that must not exist yet; never overwrites another blob
pub(crate) async fn write_new_blob(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(data).await?;
    file.flush().await?;
    Ok(())
}

fn bad_upload(e: impl std::fmt::Display) -> AppError {
    AppError::InvalidInput(format!("Failed to read upload: {}", e))
}

/// Store a multipart `file` field, optionally attached to one of the caller's notes
///
/// The blob is written before its metadata row; the two are not atomic.
pub async fn upload_file(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileRecord>)> {
    let mut upload: Option<Upload> = None;
    let mut note_id: Option<i64> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_upload)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let name = sanitize_file_name(field.file_name().unwrap_or_default());
                let mime_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_MIME_TYPE)
                    .to_string();
                let data = field.bytes().await.map_err(bad_upload)?.to_vec();
                upload = Some(Upload {
                    name,
                    mime_type,
                    data,
                });
            }
            Some("note_id") => {
                let raw = field.text().await.map_err(bad_upload)?;
                if !raw.trim().is_empty() {
                    let id = raw.trim().parse().map_err(|_| {
                        AppError::InvalidInput("note_id must be an integer".to_string())
                    })?;
                    note_id = Some(id);
                }
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| {
        AppError::InvalidInput("No file uploaded. Use the field name 'file'.".to_string())
    })?;

    if upload.data.len() > state.config.max_upload_bytes {
        tracing::warn!(
            "Upload too large from user {}: {} bytes (max: {})",
            auth.user_id,
            upload.data.len(),
            state.config.max_upload_bytes
        );
        return Err(AppError::InvalidInput(format!(
            "File exceeds the {} byte limit",
            state.config.max_upload_bytes
        )));
    }

    let mut conn = state.db.acquire().await?;
    if let Some(note_id) = note_id {
        ensure_note_owned(&mut conn, auth.user_id, note_id).await?;
    }

    let now = Utc::now();
    let dir = state.config.upload_dir.join(auth.user_id.to_string());
    tokio::fs::create_dir_all(&dir).await?;
    let path = dir.join(stored_file_name(
        now.timestamp(),
        &generate_blob_suffix(),
        &upload.name,
    ));
    write_new_blob(&path, &upload.data).await?;

    let record = sqlx::query_as::<_, FileRecord>(
        "INSERT INTO files (name, path, size, mime_type, note_id, user_id, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(&upload.name)
    .bind(path.to_string_lossy().to_string())
    .bind(upload.data.len() as i64)
    .bind(&upload.mime_type)
    .bind(note_id)
    .bind(auth.user_id)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    tracing::info!(
        "User {} uploaded file {} ({} bytes)",
        auth.user_id,
        record.id,
        record.size
    );

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<FileQuery>,
) -> Result<Json<FilesResponse>> {
    let files = sqlx::query_as::<_, FileRecord>(
        "SELECT * FROM files WHERE user_id = ? AND (? IS NULL OR note_id = ?)
         ORDER BY created_at DESC, id DESC",
    )
    .bind(auth.user_id)
    .bind(query.note_id)
    .bind(query.note_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(FilesResponse { files }))
}

async fn fetch_file(state: &AppState, user_id: i64, id: i64) -> Result<FileRecord> {
    sqlx::query_as::<_, FileRecord>("SELECT * FROM files WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound(ERR_FILE_NOT_FOUND))
}

pub async fn download_file(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Response> {
    let record = fetch_file(&state, auth.user_id, id).await?;

    let data = match tokio::fs::read(&record.path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Blob for file {} is missing at {}", record.id, record.path);
            return Err(AppError::NotFound(ERR_FILE_NOT_FOUND));
        }
        Err(e) => return Err(e.into()),
    };

    Ok((
        [
            (header::CONTENT_TYPE, record.mime_type.clone()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", record.name.replace('"', "")),
            ),
        ],
        data,
    )
        .into_response())
}

pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>> {
    let record = fetch_file(&state, auth.user_id, id).await?;

    if let Err(e) = tokio::fs::remove_file(&record.path).await {
        tracing::warn!("Could not remove blob {}: {}", record.path, e);
    }

    sqlx::query("DELETE FROM files WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(auth.user_id)
        .execute(&state.db)
        .await?;

    Ok(MessageResponse::json("File deleted"))
}
