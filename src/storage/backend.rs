//! BackendAdapter trait definition.

use async_trait::async_trait;

use super::records::{
    GroupRecord, GroupSnapshot, GroupUpsert, MessageRecord, NewMessage, SnapshotRecord,
};
use super::Result;

/// Storage engine behind an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Single local file (SQLite).
    Embedded,
    /// Client-server database over a connection pool (PostgreSQL).
    Networked,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Embedded => "embedded",
            BackendKind::Networked => "networked",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How the ingestion layer should issue write-only operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Await every write on the caller's task.
    Inline,
    /// Spawn writes and observe failures only through logs.
    Detached,
}

/// Interface for group, message and history persistence.
///
/// All store components operate only through this trait; the concrete engine
/// is chosen once at startup by [`crate::storage::init_storage`].
///
/// Implementations:
/// - `SqliteStore`: embedded single-file storage
/// - `PostgresStore`: networked, connection-pooled storage
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Engine behind this adapter.
    fn kind(&self) -> BackendKind;

    /// Dispatch mode for fire-and-forget writes.
    fn dispatch_mode(&self) -> DispatchMode {
        match self.kind() {
            BackendKind::Embedded => DispatchMode::Inline,
            BackendKind::Networked => DispatchMode::Detached,
        }
    }

    /// Insert the group, or overwrite `name` and `updated_at` if it exists.
    async fn upsert_group(&self, group: &GroupUpsert) -> Result<()>;

    /// Insert the message unless its id is already stored.
    ///
    /// Returns `true` when a row was written.
    async fn insert_message_if_absent(&self, message: &NewMessage) -> Result<bool>;

    /// Append a history row unconditionally, returning its surrogate id.
    async fn insert_history_snapshot(&self, snapshot: &GroupSnapshot) -> Result<i64>;

    /// Most recent history row (highest id) for a group.
    async fn get_latest_history_snapshot(&self, group_id: &str) -> Result<Option<SnapshotRecord>>;

    /// Fetch a single group.
    async fn get_group(&self, id: &str) -> Result<Option<GroupRecord>>;

    /// All groups ordered by name, then id.
    async fn list_groups(&self) -> Result<Vec<GroupRecord>>;

    /// Messages of a group ordered by source timestamp, then id.
    async fn list_messages(&self, group_id: &str, limit: u32) -> Result<Vec<MessageRecord>>;

    /// Full history of a group in insertion order.
    async fn list_history(&self, group_id: &str) -> Result<Vec<SnapshotRecord>>;
}
