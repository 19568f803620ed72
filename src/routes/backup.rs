use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::constants::ERR_BACKUP_NOT_FOUND;
use crate::db::notes::attach_relations;
use crate::error::{AppError, Result};
use crate::extract::ApiPath;
use crate::models::backup::{BackupSnapshot, CreateBackupResponse};
use crate::models::{Backup, Category, Note, Reminder, Tag, Template};
use crate::routes::files::write_new_blob;
use crate::security::generate_blob_suffix;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct BackupsResponse {
    pub backups: Vec<Backup>,
}

/// Write a full JSON snapshot of the caller's data and record its metadata
///
/// The snapshot is read inside one transaction so it reflects a single point
/// in time. If the metadata insert fails the written file is removed.
pub async fn create_backup(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<(StatusCode, Json<CreateBackupResponse>)> {
    let user_id = auth.user_id;
    let mut tx = state.db.begin().await?;

    let mut notes = sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE user_id = ? ORDER BY id")
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;
    attach_relations(&mut tx, user_id, &mut notes).await?;

    let categories =
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await?;
    let tags = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE user_id = ? ORDER BY id")
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;
    let templates =
        sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await?;
    let reminders =
        sqlx::query_as::<_, Reminder>("SELECT * FROM reminders WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await?;

    let now = Utc::now();
    let snapshot = BackupSnapshot {
        notes,
        categories,
        tags,
        templates,
        reminders,
        created_at: now,
    };
    let bytes = serde_json::to_vec_pretty(&snapshot)?;

    tokio::fs::create_dir_all(&state.config.backup_dir).await?;
    let name = Backup::file_name(user_id, now.timestamp(), &generate_blob_suffix());
    let path = state.config.backup_dir.join(&name);
    write_new_blob(&path, &bytes).await?;

    let inserted = sqlx::query_as::<_, Backup>(
        "INSERT INTO backups (name, path, size, user_id, created_at)
         VALUES (?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(&name)
    .bind(path.to_string_lossy().to_string())
    .bind(bytes.len() as i64)
    .bind(user_id)
    .bind(now)
    .fetch_one(&mut *tx)
    .await;

    let backup = match inserted {
        Ok(backup) => backup,
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&path).await {
                tracing::warn!("Could not remove orphaned backup {:?}: {}", path, rm);
            }
            return Err(e.into());
        }
    };

    if let Err(e) = tx.commit().await {
        if let Err(rm) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Could not remove orphaned backup {:?}: {}", path, rm);
        }
        return Err(e.into());
    }

    tracing::info!("Backup stored for user {}: {} bytes", user_id, backup.size);

    Ok((
        StatusCode::CREATED,
        Json(CreateBackupResponse {
            download_url: format!("/api/backups/{}/download", backup.id),
            backup,
        }),
    ))
}

pub async fn list_backups(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<BackupsResponse>> {
    let backups = sqlx::query_as::<_, Backup>(
        "SELECT * FROM backups WHERE user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(BackupsResponse { backups }))
}

/// Return a stored snapshot as a JSON attachment
pub async fn download_backup(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Response> {
    let backup = sqlx::query_as::<_, Backup>("SELECT * FROM backups WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(auth.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound(ERR_BACKUP_NOT_FOUND))?;

    let data = match tokio::fs::read(&backup.path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Backup file missing for backup {}: {}", backup.id, backup.path);
            return Err(AppError::NotFound(ERR_BACKUP_NOT_FOUND));
        }
        Err(e) => return Err(e.into()),
    };

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", backup.name),
            ),
        ],
        data,
    )
        .into_response())
}
