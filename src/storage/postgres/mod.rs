//! PostgreSQL (networked engine) connection and schema driver.

mod schema_driver;

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use tracing::info;

pub use schema_driver::PostgresSchema;

pub use super::sql::postgres::{Postgres, PostgresStore};
use crate::config::NetworkedConfig;

/// Build connection options from configuration.
pub fn connect_options(config: &NetworkedConfig) -> PgConnectOptions {
    let ssl_mode = if config.tls {
        PgSslMode::Require
    } else {
        PgSslMode::Disable
    };

    let mut opts = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.database)
        .username(&config.user)
        .ssl_mode(ssl_mode);

    if let Some(password) = &config.password {
        opts = opts.password(password);
    }

    opts
}

/// Create a bounded connection pool.
pub async fn connect(config: &NetworkedConfig) -> Result<PgPool, super::InitError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
        .connect_with(connect_options(config))
        .await
        .map_err(super::InitError::Connect)?;

    info!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        max_connections = config.max_connections,
        tls = config.tls,
        "networked database pool created"
    );
    Ok(pool)
}
