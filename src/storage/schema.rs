//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building,
//! plus the DDL each engine runs when the baseline schema is ensured.

use sea_query::Iden;

/// Groups table schema.
#[derive(Iden)]
pub enum Groups {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "name"]
    Name,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
    #[iden = "deleted_at"]
    DeletedAt,
}

/// Messages table schema.
#[derive(Iden)]
pub enum Messages {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "group_id"]
    GroupId,
    #[iden = "user_id"]
    UserId,
    #[iden = "body"]
    Body,
    #[iden = "type"]
    Type,
    #[iden = "timestamp"]
    Timestamp,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
    #[iden = "deleted_at"]
    DeletedAt,
    #[iden = "metadata_blob"]
    MetadataBlob,
}

/// Group metadata history table schema.
#[derive(Iden)]
pub enum History {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "group_id"]
    GroupId,
    #[iden = "name"]
    Name,
    #[iden = "users_count"]
    UsersCount,
    #[iden = "description"]
    Description,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
    #[iden = "deleted_at"]
    DeletedAt,
}

/// Table that records which versioned migrations have been applied.
pub const SCHEMA_VERSION_TABLE: &str = "schema_version";

/// Name of the shadow table used while rebuilding `messages`.
pub const MESSAGES_SHADOW_TABLE: &str = "__messages_new";

/// Legacy history table name from before the `history` rename.
pub const LEGACY_HISTORY_TABLE: &str = "history_info_groups";

/// Legacy name of the metadata blob column.
pub const LEGACY_METADATA_COLUMN: &str = "json_dump";

/// Auxiliary tables that are no longer part of the data model.
pub const DEPRECATED_TABLES: &[&str] = &["group_members", "users"];

/// Columns of `messages` in their canonical order.
pub const MESSAGE_COLUMNS: &[&str] = &[
    "id",
    "group_id",
    "user_id",
    "body",
    "type",
    "timestamp",
    "created_at",
    "updated_at",
    "deleted_at",
    "metadata_blob",
];

/// Columns copied when adopting the legacy history table.
pub const HISTORY_COPY_COLUMNS: &[&str] = &[
    "group_id",
    "name",
    "users_count",
    "description",
    "created_at",
    "updated_at",
    "deleted_at",
];

/// Lookup indexes created by the index migration.
pub const LOOKUP_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_history_group_id ON history(group_id, id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_group_timestamp ON messages(group_id, timestamp)",
];

/// Render the `messages` DDL under a given table name.
///
/// The rebuild migration creates the shadow table from the same definition,
/// so both engines keep a single source for the column set.
pub fn messages_ddl(table: &str, timestamp_type: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {table} (
    id TEXT PRIMARY KEY,
    group_id TEXT NOT NULL,
    user_id TEXT,
    body TEXT,
    type TEXT,
    timestamp {timestamp_type},
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT,
    metadata_blob TEXT
)"#
    )
}

/// SQL for creating the schema version table.
pub const CREATE_SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version BIGINT PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
)"#;

/// SQL for creating the groups table.
pub const CREATE_GROUPS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS groups (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT
)"#;

/// SQLite DDL for the history table.
pub const SQLITE_CREATE_HISTORY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    group_id TEXT NOT NULL,
    name TEXT,
    users_count INTEGER,
    description TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT
)"#;

/// PostgreSQL DDL for the history table.
pub const POSTGRES_CREATE_HISTORY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS history (
    id BIGSERIAL PRIMARY KEY,
    group_id TEXT NOT NULL,
    name TEXT,
    users_count BIGINT,
    description TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT
)"#;
