//! Schema management.
//!
//! `SchemaManager::ensure_schema` runs on every start. It first creates the
//! baseline tables (failure is fatal), then applies each versioned migration
//! that has no row in `schema_version`. Migrations are idempotent on their
//! own and best effort: a failing migration is logged, reported as degraded,
//! left unrecorded so the next start retries it, and the remaining
//! migrations still run.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::helpers::quote_ident;
use super::schema::{
    DEPRECATED_TABLES, HISTORY_COPY_COLUMNS, LEGACY_HISTORY_TABLE, LEGACY_METADATA_COLUMN,
    LOOKUP_INDEXES, MESSAGES_SHADOW_TABLE, MESSAGE_COLUMNS,
};
use super::BackendKind;

/// Fatal schema failure: a required table could not be created.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to create required table {table}: {source}")]
    Fatal {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// Work performed by a versioned migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    /// Give `messages` its metadata blob column.
    MetadataBlobColumn,
    /// Rebuild `messages` without foreign-key constraints.
    DropMessageForeignKeys,
    /// Drop auxiliary tables no longer in the data model.
    DropDeprecatedTables,
    /// Move rows of the legacy history table into `history`.
    AdoptLegacyHistory,
    /// Create lookup indexes for history and message reads.
    LookupIndexes,
}

/// A versioned, idempotent migration.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub step: MigrationStep,
}

/// Ordered list of migrations applied after the baseline.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "messages_metadata_blob",
        step: MigrationStep::MetadataBlobColumn,
    },
    Migration {
        version: 2,
        name: "messages_drop_foreign_keys",
        step: MigrationStep::DropMessageForeignKeys,
    },
    Migration {
        version: 3,
        name: "drop_deprecated_tables",
        step: MigrationStep::DropDeprecatedTables,
    },
    Migration {
        version: 4,
        name: "adopt_legacy_history",
        step: MigrationStep::AdoptLegacyHistory,
    },
    Migration {
        version: 5,
        name: "lookup_indexes",
        step: MigrationStep::LookupIndexes,
    },
];

/// A migration that failed and was skipped for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedMigration {
    pub version: i64,
    pub name: &'static str,
    pub error: String,
}

/// Outcome of `ensure_schema`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    /// Versions applied during this run.
    pub applied: Vec<i64>,
    /// Migrations that failed; the schema is usable but not current.
    pub degraded: Vec<DegradedMigration>,
}

impl SchemaReport {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Engine-specific primitives the schema manager is built from.
#[async_trait]
pub trait SchemaDriver: Send + Sync {
    /// Engine this driver manages.
    fn kind(&self) -> BackendKind;

    /// Required tables, in creation order, with their DDL.
    fn baseline(&self) -> Vec<(&'static str, String)>;

    /// DDL for the current `messages` schema under the given table name.
    fn messages_ddl(&self, table: &str) -> String;

    /// Statements run after the shadow table is renamed into place.
    fn rebuild_epilogue(&self) -> Vec<String> {
        Vec::new()
    }

    /// Execute a single statement.
    async fn execute(&self, sql: &str) -> sqlx::Result<()>;

    /// Execute statements in one transaction on one connection.
    ///
    /// With `foreign_keys_off`, enforcement is disabled for the duration and
    /// restored afterward whether or not the statements succeed.
    async fn execute_atomic(&self, statements: &[String], foreign_keys_off: bool)
        -> sqlx::Result<()>;

    async fn table_exists(&self, table: &str) -> sqlx::Result<bool>;

    /// Column names of a table in declaration order.
    async fn table_columns(&self, table: &str) -> sqlx::Result<Vec<String>>;

    /// Number of foreign-key constraints declared on a table.
    async fn foreign_key_count(&self, table: &str) -> sqlx::Result<i64>;

    async fn applied_versions(&self) -> sqlx::Result<Vec<i64>>;

    async fn record_version(&self, version: i64, name: &str) -> sqlx::Result<()>;
}

/// Ensures the schema exists and is current.
pub struct SchemaManager<D: SchemaDriver> {
    driver: D,
}

impl<D: SchemaDriver> SchemaManager<D> {
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Create required tables and apply pending migrations.
    pub async fn ensure_schema(&self) -> Result<SchemaReport, SchemaError> {
        for (table, ddl) in self.driver.baseline() {
            self.driver
                .execute(&ddl)
                .await
                .map_err(|source| SchemaError::Fatal { table, source })?;
        }

        let applied: HashSet<i64> = match self.driver.applied_versions().await {
            Ok(versions) => versions.into_iter().collect(),
            Err(source) => {
                return Err(SchemaError::Fatal {
                    table: super::schema::SCHEMA_VERSION_TABLE,
                    source,
                })
            }
        };

        let mut report = SchemaReport::default();

        for migration in MIGRATIONS {
            if applied.contains(&migration.version) {
                continue;
            }

            let outcome = match self.apply(migration.step).await {
                Ok(()) => {
                    self.driver
                        .record_version(migration.version, migration.name)
                        .await
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => {
                    debug!(
                        version = migration.version,
                        name = migration.name,
                        "migration applied"
                    );
                    report.applied.push(migration.version);
                }
                Err(e) => {
                    warn!(
                        backend = %self.driver.kind(),
                        version = migration.version,
                        name = migration.name,
                        error = %e,
                        "migration failed, continuing with existing schema"
                    );
                    report.degraded.push(DegradedMigration {
                        version: migration.version,
                        name: migration.name,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            backend = %self.driver.kind(),
            applied = report.applied.len(),
            degraded = report.degraded.len(),
            "schema ensured"
        );

        Ok(report)
    }

    async fn apply(&self, step: MigrationStep) -> sqlx::Result<()> {
        match step {
            MigrationStep::MetadataBlobColumn => self.metadata_blob_column().await,
            MigrationStep::DropMessageForeignKeys => self.drop_message_foreign_keys().await,
            MigrationStep::DropDeprecatedTables => self.drop_deprecated_tables().await,
            MigrationStep::AdoptLegacyHistory => self.adopt_legacy_history().await,
            MigrationStep::LookupIndexes => {
                for sql in LOOKUP_INDEXES {
                    self.driver.execute(sql).await?;
                }
                Ok(())
            }
        }
    }

    async fn metadata_blob_column(&self) -> sqlx::Result<()> {
        let columns = self.driver.table_columns("messages").await?;
        if columns.iter().any(|c| c == "metadata_blob") {
            return Ok(());
        }

        if columns.iter().any(|c| c == LEGACY_METADATA_COLUMN) {
            info!(from = LEGACY_METADATA_COLUMN, "renaming messages metadata column");
            self.driver
                .execute(&format!(
                    "ALTER TABLE messages RENAME COLUMN {} TO metadata_blob",
                    LEGACY_METADATA_COLUMN
                ))
                .await
        } else {
            info!("adding messages.metadata_blob");
            self.driver
                .execute("ALTER TABLE messages ADD COLUMN metadata_blob TEXT")
                .await
        }
    }

    async fn drop_message_foreign_keys(&self) -> sqlx::Result<()> {
        let foreign_keys = self.driver.foreign_key_count("messages").await?;
        if foreign_keys == 0 {
            return Ok(());
        }

        let legacy_columns = self.driver.table_columns("messages").await?;
        let statements = rebuild_statements(
            &self.driver.messages_ddl(MESSAGES_SHADOW_TABLE),
            &legacy_columns,
            self.driver.rebuild_epilogue(),
        );

        info!(foreign_keys, "rebuilding messages without foreign keys");
        self.driver.execute_atomic(&statements, true).await
    }

    async fn drop_deprecated_tables(&self) -> sqlx::Result<()> {
        let statements: Vec<String> = DEPRECATED_TABLES
            .iter()
            .map(|table| format!("DROP TABLE IF EXISTS {}", table))
            .collect();
        self.driver.execute_atomic(&statements, true).await
    }

    async fn adopt_legacy_history(&self) -> sqlx::Result<()> {
        if !self.driver.table_exists(LEGACY_HISTORY_TABLE).await? {
            return Ok(());
        }

        let legacy_columns = self.driver.table_columns(LEGACY_HISTORY_TABLE).await?;
        let columns = shared_columns(HISTORY_COPY_COLUMNS, &legacy_columns);

        info!(table = LEGACY_HISTORY_TABLE, "adopting legacy history rows");
        let statements = vec![
            format!(
                "INSERT INTO history ({cols}) SELECT {cols} FROM {legacy} ORDER BY id",
                cols = columns,
                legacy = LEGACY_HISTORY_TABLE
            ),
            format!("DROP TABLE {}", LEGACY_HISTORY_TABLE),
        ];
        self.driver.execute_atomic(&statements, false).await
    }
}

/// Quoted, comma-separated list of `wanted` columns present in `available`.
fn shared_columns(wanted: &[&str], available: &[String]) -> String {
    wanted
        .iter()
        .filter(|c| available.iter().any(|a| a == *c))
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Target and source column lists for copying `messages` into the shadow.
///
/// A legacy `json_dump` column feeds `metadata_blob` while the rename is
/// still pending.
fn message_copy_columns(legacy_columns: &[String]) -> (String, String) {
    let has = |name: &str| legacy_columns.iter().any(|c| c == name);

    let mut targets = Vec::new();
    let mut sources = Vec::new();
    for column in MESSAGE_COLUMNS {
        let source = if has(*column) {
            *column
        } else if *column == "metadata_blob" && has(LEGACY_METADATA_COLUMN) {
            LEGACY_METADATA_COLUMN
        } else {
            continue;
        };
        targets.push(quote_ident(column));
        sources.push(quote_ident(source));
    }

    (targets.join(", "), sources.join(", "))
}

/// Statements that swap `messages` for a foreign-key-free copy.
///
/// Only columns present in the legacy table are copied; conflicting ids are
/// ignored. The `WHERE true` keeps SQLite from reading `ON CONFLICT` as a
/// join constraint.
fn rebuild_statements(shadow_ddl: &str, legacy_columns: &[String], epilogue: Vec<String>) -> Vec<String> {
    let (targets, sources) = message_copy_columns(legacy_columns);

    let mut statements = vec![
        format!("DROP TABLE IF EXISTS {}", MESSAGES_SHADOW_TABLE),
        shadow_ddl.to_string(),
        format!(
            "INSERT INTO {shadow} ({targets}) SELECT {sources} FROM messages WHERE true ON CONFLICT (id) DO NOTHING",
            shadow = MESSAGES_SHADOW_TABLE,
            targets = targets,
            sources = sources
        ),
        "DROP TABLE messages".to_string(),
        format!("ALTER TABLE {} RENAME TO messages", MESSAGES_SHADOW_TABLE),
    ];
    statements.extend(epilogue);
    statements
}
