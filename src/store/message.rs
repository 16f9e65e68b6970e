//! Idempotent message persistence.

use std::sync::Arc;
use std::time::Duration;

use crate::storage::{with_timeout, BackendAdapter, MessageRecord, NewMessage, Result};

use super::require;

/// Write-once store for inbound messages.
#[derive(Clone)]
pub struct MessageStore {
    backend: Arc<dyn BackendAdapter>,
    timeout: Duration,
}

impl MessageStore {
    pub fn new(backend: Arc<dyn BackendAdapter>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Store the message unless its id was seen before.
    ///
    /// Redelivered messages are a no-op and return `false`; the stored row is
    /// never overwritten.
    pub async fn insert_message_if_absent(&self, message: NewMessage) -> Result<bool> {
        require("message id", &message.id)?;
        require("group id", &message.group_id)?;
        let message = message.normalized();
        with_timeout(
            "insert_message_if_absent",
            self.timeout,
            self.backend.insert_message_if_absent(&message),
        )
        .await
    }

    /// Messages of a group, oldest first.
    pub async fn list(&self, group_id: &str, limit: u32) -> Result<Vec<MessageRecord>> {
        with_timeout(
            "list_messages",
            self.timeout,
            self.backend.list_messages(group_id, limit),
        )
        .await
    }
}
