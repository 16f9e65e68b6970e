//! Change-detected group metadata history.
//!
//! A snapshot is appended only when its tracked attributes (`name`,
//! `users_count`, `description`) differ from the group's most recent row.
//!
//! The read and the write are separate calls. Two concurrent callers carrying
//! the same new value for one group can both observe the old row and both
//! append, leaving one redundant row. Enable per-group serialization to rule
//! that out within a process.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::storage::{with_timeout, BackendAdapter, GroupSnapshot, Result, SnapshotRecord};

use super::lock::KeyedLock;
use super::require;

/// Append-only store for group metadata snapshots.
#[derive(Clone)]
pub struct HistoryStore {
    backend: Arc<dyn BackendAdapter>,
    timeout: Duration,
    locks: Option<Arc<KeyedLock>>,
}

impl HistoryStore {
    /// Store without per-group serialization.
    pub fn new(backend: Arc<dyn BackendAdapter>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            locks: None,
        }
    }

    /// Store that holds a per-group lock across read-decide-write.
    pub fn serialized(backend: Arc<dyn BackendAdapter>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            locks: Some(Arc::new(KeyedLock::new())),
        }
    }

    pub fn is_serialized(&self) -> bool {
        self.locks.is_some()
    }

    /// Append `snapshot` if it differs from the latest stored row.
    ///
    /// Returns `true` when a row was written. A failed lookup is logged and
    /// treated as "changed"; a failed insert is returned.
    pub async fn insert_snapshot_if_changed(&self, snapshot: GroupSnapshot) -> Result<bool> {
        require("group id", &snapshot.group_id)?;
        let snapshot = snapshot.normalized();

        let _guard = match &self.locks {
            Some(locks) => Some(locks.lock(&snapshot.group_id).await),
            None => None,
        };

        let latest = with_timeout(
            "get_latest_history_snapshot",
            self.timeout,
            self.backend.get_latest_history_snapshot(&snapshot.group_id),
        )
        .await;

        let changed = match latest {
            Ok(Some(row)) => !row.matches(&snapshot),
            Ok(None) => true,
            Err(e) => {
                warn!(
                    group_id = %snapshot.group_id,
                    error = %e,
                    "latest snapshot lookup failed, treating as changed"
                );
                true
            }
        };

        if !changed {
            debug!(group_id = %snapshot.group_id, "group metadata unchanged");
            return Ok(false);
        }

        let id = self.insert_snapshot(&snapshot).await?;
        debug!(group_id = %snapshot.group_id, id, "group metadata snapshot appended");
        Ok(true)
    }

    /// Append `snapshot` unconditionally, returning the new row id.
    pub async fn insert_snapshot(&self, snapshot: &GroupSnapshot) -> Result<i64> {
        require("group id", &snapshot.group_id)?;
        with_timeout(
            "insert_history_snapshot",
            self.timeout,
            self.backend.insert_history_snapshot(snapshot),
        )
        .await
    }

    pub async fn latest(&self, group_id: &str) -> Result<Option<SnapshotRecord>> {
        with_timeout(
            "get_latest_history_snapshot",
            self.timeout,
            self.backend.get_latest_history_snapshot(group_id),
        )
        .await
    }

    /// Full history of a group, oldest first.
    pub async fn history(&self, group_id: &str) -> Result<Vec<SnapshotRecord>> {
        with_timeout("list_history", self.timeout, self.backend.list_history(group_id)).await
    }
}
