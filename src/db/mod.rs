pub mod canvas;
pub mod notes;
pub mod pool;

use sqlx::SqlitePool;
use std::path::Path;

pub use pool::create_pool;

use crate::error::Result;

/// Database handle type (pool is cheaply cloneable across handlers)
pub type Db = SqlitePool;

/// Open or create the database at the given path and bring its schema up to date
pub async fn open_database(path: impl AsRef<Path>) -> Result<Db> {
    let path = path.as_ref();
    tracing::info!("Opening database at: {:?}", path);

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                e
            })?;
        }
    }

    let pool = create_pool(path).await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database initialized successfully");

    Ok(pool)
}
