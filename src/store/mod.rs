//! Store components.
//!
//! Each store wraps the process-wide [`BackendAdapter`], validates input and
//! bounds every backend call by the configured operation timeout.

mod group;
mod history;
mod lock;
mod message;

use std::sync::Arc;

pub use group::GroupStore;
pub use history::HistoryStore;
pub use lock::{KeyedGuard, KeyedLock};
pub use message::MessageStore;

use crate::config::StorageConfig;
use crate::storage::{BackendAdapter, Result, StorageError};

fn require(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(StorageError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// The three stores sharing one adapter.
#[derive(Clone)]
pub struct Stores {
    pub groups: GroupStore,
    pub messages: MessageStore,
    pub history: HistoryStore,
}

impl Stores {
    pub fn new(backend: Arc<dyn BackendAdapter>, config: &StorageConfig) -> Self {
        let timeout = config.operation_timeout();
        let history = if config.serialize_snapshots {
            HistoryStore::serialized(backend.clone(), timeout)
        } else {
            HistoryStore::new(backend.clone(), timeout)
        };

        Self {
            groups: GroupStore::new(backend.clone(), timeout),
            messages: MessageStore::new(backend, timeout),
            history,
        }
    }
}
