//! Ingestion supervisor.
//!
//! Turns upstream events into store calls. Write-only operations are awaited
//! on the caller's task for the embedded engine and spawned for the networked
//! one, per the adapter's [`DispatchMode`]. Every failure ends up in the log;
//! nothing here halts the process.

mod event;

use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Mutex;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

pub use event::{GroupMetadataEvent, GroupRef, IngestEvent, MessageEvent};

use crate::config::StorageConfig;
use crate::storage::{BackendAdapter, DispatchMode, GroupUpsert, Result};
use crate::store::Stores;

/// Result of a write-only operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    /// Row written.
    Applied,
    /// Nothing to write (already stored).
    Skipped,
    /// Handed to a background task.
    Dispatched,
    Failed(String),
}

/// Result of the history change gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotStatus {
    Appended,
    Unchanged,
    Failed(String),
}

/// What handling one event did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    pub group: Option<WriteStatus>,
    pub message: Option<WriteStatus>,
    pub snapshot: Option<SnapshotStatus>,
}

impl IngestOutcome {
    pub fn has_failure(&self) -> bool {
        matches!(self.group, Some(WriteStatus::Failed(_)))
            || matches!(self.message, Some(WriteStatus::Failed(_)))
            || matches!(self.snapshot, Some(SnapshotStatus::Failed(_)))
    }
}

/// Counters for a stream of event lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub events: usize,
    pub malformed: usize,
    /// Events with a failure observed inline.
    pub failed: usize,
}

pub struct Ingestor {
    stores: Stores,
    mode: DispatchMode,
    inflight: Mutex<JoinSet<()>>,
}

impl Ingestor {
    pub fn new(stores: Stores, mode: DispatchMode) -> Self {
        Self {
            stores,
            mode,
            inflight: Mutex::new(JoinSet::new()),
        }
    }

    /// Ingestor using the adapter's own dispatch mode.
    pub fn from_backend(backend: Arc<dyn BackendAdapter>, config: &StorageConfig) -> Self {
        let mode = backend.dispatch_mode();
        Self::new(Stores::new(backend, config), mode)
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub async fn handle(&self, event: IngestEvent) -> IngestOutcome {
        match event {
            IngestEvent::GroupSeen(group) => IngestOutcome {
                group: Some(self.upsert_group(GroupUpsert::from(&group)).await),
                ..Default::default()
            },
            IngestEvent::Message(message) => self.handle_message(message).await,
            IngestEvent::GroupMetadata(metadata) => self.handle_metadata(metadata).await,
        }
    }

    /// Parse and handle one line. Blank lines are ignored; malformed ones are
    /// logged and skipped.
    pub async fn handle_line(&self, line: &str) -> Option<IngestOutcome> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match IngestEvent::parse(line) {
            Ok(event) => {
                debug!(event = event.kind(), "event received");
                Some(self.handle(event).await)
            }
            Err(e) => {
                warn!(error = %e, "skipping malformed event line");
                None
            }
        }
    }

    /// Handle every line of `reader` until EOF.
    ///
    /// Lines that are not valid UTF-8 count as malformed; only a read error
    /// ends the stream early.
    pub async fn ingest_lines<R>(&self, mut reader: R) -> std::io::Result<IngestStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut stats = IngestStats::default();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "skipping event line that is not valid UTF-8");
                    stats.malformed += 1;
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match self.handle_line(line).await {
                Some(outcome) => {
                    stats.events += 1;
                    if outcome.has_failure() {
                        stats.failed += 1;
                    }
                }
                None => stats.malformed += 1,
            }
        }
        Ok(stats)
    }

    /// Wait for every dispatched write. Returns how many completed.
    pub async fn drain(&self) -> usize {
        let mut inflight = self.inflight.lock().await;
        let mut completed = 0;
        while let Some(joined) = inflight.join_next().await {
            log_join(joined);
            completed += 1;
        }
        if completed > 0 {
            info!(completed, "dispatched writes drained");
        }
        completed
    }

    /// Writes spawned and not yet reaped.
    pub async fn pending(&self) -> usize {
        self.inflight.lock().await.len()
    }

    async fn handle_message(&self, message: MessageEvent) -> IngestOutcome {
        let group = self.upsert_group(GroupUpsert::from(&message.group)).await;

        let status = match message.to_new_message() {
            Ok(row) => {
                let store = self.stores.messages.clone();
                self.dispatch("insert_message_if_absent", async move {
                    store.insert_message_if_absent(row).await
                })
                .await
            }
            Err(e) => {
                error!(message_id = %message.id, error = %e, "failed to serialize message metadata");
                WriteStatus::Failed(e.to_string())
            }
        };

        IngestOutcome {
            group: Some(group),
            message: Some(status),
            snapshot: None,
        }
    }

    async fn handle_metadata(&self, metadata: GroupMetadataEvent) -> IngestOutcome {
        let group = match metadata.to_upsert() {
            Some(upsert) => Some(self.upsert_group(upsert).await),
            None => None,
        };

        // The change gate is always awaited, whatever the dispatch mode.
        let snapshot = match self
            .stores
            .history
            .insert_snapshot_if_changed(metadata.to_snapshot())
            .await
        {
            Ok(true) => {
                info!(group_id = %metadata.id, "group metadata changed, snapshot stored");
                SnapshotStatus::Appended
            }
            Ok(false) => SnapshotStatus::Unchanged,
            Err(e) => {
                error!(group_id = %metadata.id, error = %e, "failed to store group snapshot");
                SnapshotStatus::Failed(e.to_string())
            }
        };

        IngestOutcome {
            group,
            message: None,
            snapshot: Some(snapshot),
        }
    }

    async fn upsert_group(&self, group: GroupUpsert) -> WriteStatus {
        let store = self.stores.groups.clone();
        self.dispatch("upsert_group", async move {
            store.upsert_group(&group).await.map(|()| true)
        })
        .await
    }

    async fn dispatch<F>(&self, operation: &'static str, write: F) -> WriteStatus
    where
        F: Future<Output = Result<bool>> + Send + 'static,
    {
        match self.mode {
            DispatchMode::Inline => settle(operation, write.await),
            DispatchMode::Detached => {
                let mut inflight = self.inflight.lock().await;
                while let Some(joined) = inflight.try_join_next() {
                    log_join(joined);
                }
                inflight.spawn(async move {
                    settle(operation, write.await);
                });
                WriteStatus::Dispatched
            }
        }
    }
}

fn settle(operation: &'static str, result: Result<bool>) -> WriteStatus {
    match result {
        Ok(true) => WriteStatus::Applied,
        Ok(false) => {
            debug!(operation, "already stored");
            WriteStatus::Skipped
        }
        Err(e) => {
            error!(operation, error = %e, "write failed");
            WriteStatus::Failed(e.to_string())
        }
    }
}

fn log_join(joined: std::result::Result<(), JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "dispatched write aborted");
    }
}
