//! Group identity persistence.

use std::sync::Arc;
use std::time::Duration;

use crate::storage::{with_timeout, BackendAdapter, GroupRecord, GroupUpsert, Result};

use super::require;

/// Upsert-by-id store for groups.
#[derive(Clone)]
pub struct GroupStore {
    backend: Arc<dyn BackendAdapter>,
    timeout: Duration,
}

impl GroupStore {
    pub fn new(backend: Arc<dyn BackendAdapter>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Insert the group or overwrite its name, keeping `created_at`.
    pub async fn upsert_group(&self, group: &GroupUpsert) -> Result<()> {
        require("group id", &group.id)?;
        with_timeout("upsert_group", self.timeout, self.backend.upsert_group(group)).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<GroupRecord>> {
        with_timeout("get_group", self.timeout, self.backend.get_group(id)).await
    }

    pub async fn list(&self) -> Result<Vec<GroupRecord>> {
        with_timeout("list_groups", self.timeout, self.backend.list_groups()).await
    }
}
