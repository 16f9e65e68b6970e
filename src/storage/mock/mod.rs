//! Mock storage implementation for testing.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::helpers::now_rfc3339;
use super::{
    BackendAdapter, BackendKind, GroupRecord, GroupSnapshot, GroupUpsert, MessageRecord,
    NewMessage, Result, SnapshotRecord, StorageError,
};

/// In-memory adapter with failure injection.
pub struct MockBackend {
    kind: BackendKind,
    groups: RwLock<HashMap<String, GroupRecord>>,
    messages: RwLock<HashMap<String, MessageRecord>>,
    history: RwLock<Vec<SnapshotRecord>>,
    fail_on_write: RwLock<bool>,
    fail_on_read: RwLock<bool>,
    read_delay: RwLock<Option<Duration>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::with_kind(BackendKind::Embedded)
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that reports `kind`, and therefore its dispatch mode.
    pub fn with_kind(kind: BackendKind) -> Self {
        Self {
            kind,
            groups: RwLock::default(),
            messages: RwLock::default(),
            history: RwLock::default(),
            fail_on_write: RwLock::new(false),
            fail_on_read: RwLock::new(false),
            read_delay: RwLock::new(None),
        }
    }

    pub async fn set_fail_on_write(&self, fail: bool) {
        *self.fail_on_write.write().await = fail;
    }

    pub async fn set_fail_on_read(&self, fail: bool) {
        *self.fail_on_read.write().await = fail;
    }

    /// Delay every latest-snapshot lookup by `delay`.
    pub async fn set_read_delay(&self, delay: Option<Duration>) {
        *self.read_delay.write().await = delay;
    }

    pub async fn group_count(&self) -> usize {
        self.groups.read().await.len()
    }

    pub async fn message_count(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn history_count(&self, group_id: &str) -> usize {
        self.history
            .read()
            .await
            .iter()
            .filter(|row| row.group_id == group_id)
            .count()
    }

    async fn check_write(&self) -> Result<()> {
        if *self.fail_on_write.read().await {
            return Err(StorageError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }

    async fn check_read(&self) -> Result<()> {
        if *self.fail_on_read.read().await {
            return Err(StorageError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl BackendAdapter for MockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn upsert_group(&self, group: &GroupUpsert) -> Result<()> {
        self.check_write().await?;
        let now = now_rfc3339();
        let mut groups = self.groups.write().await;
        groups
            .entry(group.id.clone())
            .and_modify(|row| {
                row.name = group.name.clone();
                row.updated_at = now.clone();
            })
            .or_insert_with(|| GroupRecord {
                id: group.id.clone(),
                name: group.name.clone(),
                created_at: now.clone(),
                updated_at: now.clone(),
                deleted_at: None,
            });
        Ok(())
    }

    async fn insert_message_if_absent(&self, message: &NewMessage) -> Result<bool> {
        self.check_write().await?;
        let mut messages = self.messages.write().await;
        if messages.contains_key(&message.id) {
            return Ok(false);
        }
        let now = now_rfc3339();
        messages.insert(
            message.id.clone(),
            MessageRecord {
                id: message.id.clone(),
                group_id: message.group_id.clone(),
                user_id: message.user_id.clone(),
                body: message.body.clone(),
                message_type: message.message_type.clone(),
                timestamp: Some(message.timestamp),
                created_at: now.clone(),
                updated_at: now,
                deleted_at: None,
                metadata_blob: message.metadata_blob.clone(),
            },
        );
        Ok(true)
    }

    async fn insert_history_snapshot(&self, snapshot: &GroupSnapshot) -> Result<i64> {
        self.check_write().await?;
        let mut history = self.history.write().await;
        let id = history.len() as i64 + 1;
        let now = now_rfc3339();
        history.push(SnapshotRecord {
            id,
            group_id: snapshot.group_id.clone(),
            name: snapshot.name.clone(),
            users_count: snapshot.users_count,
            description: snapshot.description.clone(),
            created_at: now.clone(),
            updated_at: now,
            deleted_at: None,
        });
        Ok(id)
    }

    async fn get_latest_history_snapshot(&self, group_id: &str) -> Result<Option<SnapshotRecord>> {
        self.check_read().await?;
        let latest = self
            .history
            .read()
            .await
            .iter()
            .rev()
            .find(|row| row.group_id == group_id)
            .cloned();
        let delay = *self.read_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(latest)
    }

    async fn get_group(&self, id: &str) -> Result<Option<GroupRecord>> {
        self.check_read().await?;
        Ok(self.groups.read().await.get(id).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<GroupRecord>> {
        self.check_read().await?;
        let mut groups: Vec<_> = self.groups.read().await.values().cloned().collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn list_messages(&self, group_id: &str, limit: u32) -> Result<Vec<MessageRecord>> {
        self.check_read().await?;
        let mut messages: Vec<_> = self
            .messages
            .read()
            .await
            .values()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        messages.truncate(limit as usize);
        Ok(messages)
    }

    async fn list_history(&self, group_id: &str) -> Result<Vec<SnapshotRecord>> {
        self.check_read().await?;
        Ok(self
            .history
            .read()
            .await
            .iter()
            .filter(|row| row.group_id == group_id)
            .cloned()
            .collect())
    }
}
