//! HistoryStore interface step definitions.

use chatvault::storage::GroupSnapshot;
use chatvault::store::Stores;
use cucumber::{given, then, when, World};
use futures::future::join_all;

use crate::backend::{StorageBackend, StorageContext};

/// Test context for HistoryStore scenarios.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct HistoryStoreWorld {
    backend: StorageBackend,
    context: Option<StorageContext>,
    last_appended: Option<bool>,
    rows_before: usize,
}

impl HistoryStoreWorld {
    fn new() -> Self {
        Self {
            backend: StorageBackend::from_env(),
            context: None,
            last_appended: None,
            rows_before: 0,
        }
    }

    fn stores(&self) -> &Stores {
        self.context
            .as_ref()
            .expect("Storage context not initialized")
            .stores()
    }

    async fn row_count(&self, group: &str) -> usize {
        self.stores()
            .history
            .history(group)
            .await
            .expect("Failed to read history")
            .len()
    }
}

fn snapshot(group: &str, name: &str, users: i64) -> GroupSnapshot {
    GroupSnapshot::new(group)
        .with_name(name)
        .with_users_count(users)
}

// --- Background ---

#[given("a HistoryStore backend")]
async fn given_history_store_backend(world: &mut HistoryStoreWorld) {
    println!("Using backend: {}", world.backend.name());
    let mut ctx = StorageContext::new(world.backend).await;
    ctx.init().await;
    world.context = Some(ctx);
}

// --- Given steps ---

#[given(expr = "a snapshot of group {string} named {string} with {int} users")]
async fn given_snapshot(world: &mut HistoryStoreWorld, group: String, name: String, users: i64) {
    let appended = world
        .stores()
        .history
        .insert_snapshot_if_changed(snapshot(&group, &name, users))
        .await
        .expect("Failed to record snapshot");
    assert!(appended);
}

#[given("snapshot serialization is enabled")]
async fn given_serialization(world: &mut HistoryStoreWorld) {
    world
        .context
        .as_mut()
        .expect("Storage context not initialized")
        .serialize_snapshots(true);
    assert!(world.stores().history.is_serialized());
}

// --- When steps ---

#[when(expr = "I record a snapshot of group {string} named {string} with {int} users")]
async fn when_record_snapshot(world: &mut HistoryStoreWorld, group: String, name: String, users: i64) {
    let appended = world
        .stores()
        .history
        .insert_snapshot_if_changed(snapshot(&group, &name, users))
        .await
        .expect("Failed to record snapshot");
    world.last_appended = Some(appended);
}

#[when(
    expr = "{int} callers concurrently record a snapshot of group {string} named {string} with {int} users"
)]
async fn when_concurrent_snapshots(
    world: &mut HistoryStoreWorld,
    callers: usize,
    group: String,
    name: String,
    users: i64,
) {
    world.rows_before = world.row_count(&group).await;

    let history = &world.stores().history;
    let results = join_all(
        (0..callers).map(|_| history.insert_snapshot_if_changed(snapshot(&group, &name, users))),
    )
    .await;

    for result in results {
        result.expect("Failed to record snapshot");
    }
}

// --- Then steps ---

#[then("the snapshot was appended")]
async fn then_appended(world: &mut HistoryStoreWorld) {
    assert_eq!(world.last_appended, Some(true));
}

#[then("the snapshot was not appended")]
async fn then_not_appended(world: &mut HistoryStoreWorld) {
    assert_eq!(world.last_appended, Some(false));
}

#[then(regex = r#"^group "([^"]*)" has (\d+) history rows?$"#)]
async fn then_row_count(world: &mut HistoryStoreWorld, group: String, expected: usize) {
    assert_eq!(world.row_count(&group).await, expected);
}

#[then(expr = "group {string} gained between {int} and {int} history rows")]
async fn then_rows_gained_between(
    world: &mut HistoryStoreWorld,
    group: String,
    low: usize,
    high: usize,
) {
    let gained = world.row_count(&group).await - world.rows_before;
    assert!(
        (low..=high).contains(&gained),
        "expected {}..={} new rows, got {}",
        low,
        high,
        gained
    );
}

#[then(expr = "the latest snapshot of group {string} has {int} users")]
async fn then_latest_users(world: &mut HistoryStoreWorld, group: String, users: i64) {
    let latest = world
        .stores()
        .history
        .latest(&group)
        .await
        .expect("Failed to read latest")
        .expect("Snapshot should exist");
    assert_eq!(latest.users_count, Some(users));
}

#[then(expr = "the latest snapshot of group {string} is named {string}")]
async fn then_latest_name(world: &mut HistoryStoreWorld, group: String, name: String) {
    let latest = world
        .stores()
        .history
        .latest(&group)
        .await
        .expect("Failed to read latest")
        .expect("Snapshot should exist");
    assert_eq!(latest.name.as_deref(), Some(name.as_str()));
}
