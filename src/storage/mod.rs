//! Storage implementations.
//!
//! One `BackendAdapter` is constructed at startup by [`init_storage`]; every
//! store component works through that trait object only.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{StorageConfig, StorageType};

mod backend;
pub mod helpers;
pub mod migrations;
pub mod mock;
pub mod records;
pub mod schema;
pub mod sql;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use backend::{BackendAdapter, BackendKind, DispatchMode};
pub use migrations::{SchemaDriver, SchemaError, SchemaManager, SchemaReport};
pub use mock::MockBackend;
pub use records::{
    GroupRecord, GroupSnapshot, GroupUpsert, MessageRecord, NewMessage, SnapshotRecord,
};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteSchema, SqliteStore};

#[cfg(feature = "postgres")]
pub use postgres::{PostgresSchema, PostgresStore};

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that prevent storage from starting.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to connect: {0}")]
    Connect(#[source] sqlx::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{0} backend requested but not compiled in")]
    Unsupported(&'static str),
}

/// Initialize storage based on configuration.
///
/// Connects the configured engine, ensures its schema and returns the
/// adapter. Degraded migrations are logged; only a fatal schema error or a
/// connection failure is returned.
pub async fn init_storage(
    config: &StorageConfig,
) -> std::result::Result<Arc<dyn BackendAdapter>, InitError> {
    info!(backend = %config.storage_type, "initializing storage");

    match config.storage_type {
        #[cfg(feature = "sqlite")]
        StorageType::Embedded => {
            let pool = sqlite::connect(&config.embedded).await?;
            let report = SchemaManager::new(SqliteSchema::new(pool.clone()))
                .ensure_schema()
                .await?;
            log_report(&report);
            Ok(Arc::new(SqliteStore::new(pool)))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageType::Embedded => Err(InitError::Unsupported("embedded (sqlite)")),
        #[cfg(feature = "postgres")]
        StorageType::Networked => {
            let pool = postgres::connect(&config.networked).await?;
            let report = SchemaManager::new(PostgresSchema::new(pool.clone()))
                .ensure_schema()
                .await?;
            log_report(&report);
            Ok(Arc::new(PostgresStore::new(pool)))
        }
        #[cfg(not(feature = "postgres"))]
        StorageType::Networked => Err(InitError::Unsupported("networked (postgres)")),
    }
}

fn log_report(report: &SchemaReport) {
    for degraded in &report.degraded {
        warn!(
            version = degraded.version,
            name = degraded.name,
            error = %degraded.error,
            "schema degraded"
        );
    }
}

/// Bound a store call by `after`, mapping expiry to [`StorageError::Timeout`].
pub async fn with_timeout<T, F>(operation: &'static str, after: Duration, fut: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout { operation, after }),
    }
}
