pub mod ledger;
pub mod pool;
pub mod rewards;
pub mod users;

use sqlx::SqlitePool;
use std::path::Path;

use crate::error::{AppError, Result};

pub use pool::create_pool;

/// Database handle type (the pool is internally reference-counted)
pub type Db = SqlitePool;

/// Open or create the database at the given path and apply migrations
pub async fn open_database(path: impl AsRef<Path>) -> Result<Db> {
    let path = path.as_ref();
    tracing::info!("Opening database at: {:?}", path);

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                AppError::Database(sqlx::Error::Io(e))
            })?;
        }
    }

    let db = create_pool(path).await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("Database initialized successfully");

    Ok(db)
}

/// Current time as a Unix timestamp, the unit every table stores
pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
