//! PostgreSQL SchemaDriver implementation.
//!
//! DDL is transactional in PostgreSQL, so the messages swap runs in a single
//! transaction. Outgoing foreign keys vanish with the dropped table, which is
//! why no enforcement toggle is needed here.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::storage::migrations::SchemaDriver;
use crate::storage::schema::{
    messages_ddl, CREATE_GROUPS_TABLE, CREATE_SCHEMA_VERSION_TABLE, MESSAGES_SHADOW_TABLE,
    POSTGRES_CREATE_HISTORY_TABLE,
};
use crate::storage::{helpers, BackendKind};

/// PostgreSQL-backed schema driver.
pub struct PostgresSchema {
    pool: PgPool,
}

impl PostgresSchema {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchemaDriver for PostgresSchema {
    fn kind(&self) -> BackendKind {
        BackendKind::Networked
    }

    fn baseline(&self) -> Vec<(&'static str, String)> {
        vec![
            ("schema_version", CREATE_SCHEMA_VERSION_TABLE.to_string()),
            ("groups", CREATE_GROUPS_TABLE.to_string()),
            ("messages", self.messages_ddl("messages")),
            ("history", POSTGRES_CREATE_HISTORY_TABLE.to_string()),
        ]
    }

    fn messages_ddl(&self, table: &str) -> String {
        messages_ddl(table, "BIGINT")
    }

    fn rebuild_epilogue(&self) -> Vec<String> {
        // The shadow table's primary key index keeps its original name.
        vec![format!(
            "ALTER INDEX IF EXISTS {}_pkey RENAME TO messages_pkey",
            MESSAGES_SHADOW_TABLE
        )]
    }

    async fn execute(&self, sql: &str) -> sqlx::Result<()> {
        sqlx::query(sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn execute_atomic(
        &self,
        statements: &[String],
        _foreign_keys_off: bool,
    ) -> sqlx::Result<()> {
        let mut tx = self.pool.begin().await?;
        for sql in statements {
            sqlx::query(sql).execute(&mut *tx).await?;
        }
        tx.commit().await
    }

    async fn table_exists(&self, table: &str) -> sqlx::Result<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) FROM information_schema.tables
             WHERE table_schema = current_schema() AND table_name = $1",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        let count: i64 = row.try_get(0)?;
        Ok(count > 0)
    }

    async fn table_columns(&self, table: &str) -> sqlx::Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT column_name::text AS name FROM information_schema.columns
             WHERE table_schema = current_schema() AND table_name = $1
             ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(|row| row.try_get("name")).collect()
    }

    async fn foreign_key_count(&self, table: &str) -> sqlx::Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) FROM information_schema.table_constraints
             WHERE table_schema = current_schema() AND table_name = $1
               AND constraint_type = 'FOREIGN KEY'",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        row.try_get(0)
    }

    async fn applied_versions(&self) -> sqlx::Result<Vec<i64>> {
        let rows = sqlx::query("SELECT version FROM schema_version")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| row.try_get("version")).collect()
    }

    async fn record_version(&self, version: i64, name: &str) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO schema_version (version, name, applied_at) VALUES ($1, $2, $3)
             ON CONFLICT (version) DO NOTHING",
        )
        .bind(version)
        .bind(name)
        .bind(helpers::now_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
