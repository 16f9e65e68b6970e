//! SQLite SchemaDriver implementation.

use async_trait::async_trait;
use sqlx::{Connection, Row, SqliteConnection, SqlitePool};
use tracing::warn;

use crate::storage::migrations::SchemaDriver;
use crate::storage::schema::{
    messages_ddl, CREATE_GROUPS_TABLE, CREATE_SCHEMA_VERSION_TABLE, SQLITE_CREATE_HISTORY_TABLE,
};
use crate::storage::{helpers, BackendKind};

/// SQLite-backed schema driver.
pub struct SqliteSchema {
    pool: SqlitePool,
}

impl SqliteSchema {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn run_in_transaction(conn: &mut SqliteConnection, statements: &[String]) -> sqlx::Result<()> {
        let mut tx = conn.begin().await?;
        for sql in statements {
            sqlx::query(sql).execute(&mut *tx).await?;
        }
        tx.commit().await
    }
}

#[async_trait]
impl SchemaDriver for SqliteSchema {
    fn kind(&self) -> BackendKind {
        BackendKind::Embedded
    }

    fn baseline(&self) -> Vec<(&'static str, String)> {
        vec![
            ("schema_version", CREATE_SCHEMA_VERSION_TABLE.to_string()),
            ("groups", CREATE_GROUPS_TABLE.to_string()),
            ("messages", self.messages_ddl("messages")),
            ("history", SQLITE_CREATE_HISTORY_TABLE.to_string()),
        ]
    }

    fn messages_ddl(&self, table: &str) -> String {
        messages_ddl(table, "INTEGER")
    }

    async fn execute(&self, sql: &str) -> sqlx::Result<()> {
        sqlx::query(sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn execute_atomic(
        &self,
        statements: &[String],
        foreign_keys_off: bool,
    ) -> sqlx::Result<()> {
        // PRAGMA foreign_keys is a no-op inside a transaction and applies per
        // connection, so the whole swap runs on one connection outside any tx.
        let mut conn = self.pool.acquire().await?;

        if foreign_keys_off {
            sqlx::query("PRAGMA foreign_keys = OFF")
                .execute(&mut *conn)
                .await?;
        }

        let result = Self::run_in_transaction(&mut conn, statements).await;

        if foreign_keys_off {
            if let Err(e) = sqlx::query("PRAGMA foreign_keys = ON")
                .execute(&mut *conn)
                .await
            {
                warn!(error = %e, "failed to restore foreign key enforcement");
                // The connection must not go back to the pool without enforcement.
                drop(conn.detach());
                return result.and(Err(e));
            }
        }

        result
    }

    async fn table_exists(&self, table: &str) -> sqlx::Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.try_get(0)?;
        Ok(count > 0)
    }

    async fn table_columns(&self, table: &str) -> sqlx::Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM pragma_table_info(?) ORDER BY cid")
            .bind(table)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| row.try_get("name")).collect()
    }

    async fn foreign_key_count(&self, table: &str) -> sqlx::Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) FROM pragma_foreign_key_list(?)")
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
            "INSERT INTO schema_version (version, name, applied_at) VALUES (?, ?, ?)
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
