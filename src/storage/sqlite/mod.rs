//! SQLite (embedded engine) connection and schema driver.

mod schema_driver;

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

pub use schema_driver::SqliteSchema;

pub use super::sql::sqlite::{Sqlite, SqliteStore};
use crate::config::EmbeddedConfig;

/// Open the database file, creating it and its parent directory if needed.
///
/// The pool runs in WAL mode with foreign-key enforcement on and a busy
/// timeout, so concurrent callers in one process are serialized by SQLite
/// rather than failing with `SQLITE_BUSY`.
pub async fn connect(config: &EmbeddedConfig) -> Result<SqlitePool, super::InitError> {
    if let Some(parent) = Path::new(&config.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let opts = SqliteConnectOptions::new()
        .filename(&config.path)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(opts)
        .await
        .map_err(super::InitError::Connect)?;

    info!(path = %config.path, "embedded database opened");
    Ok(pool)
}
