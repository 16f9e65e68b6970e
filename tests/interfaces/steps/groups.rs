//! GroupStore interface step definitions.

use chatvault::storage::{GroupUpsert, StorageError};
use chatvault::store::Stores;
use cucumber::{given, then, when, World};

use crate::backend::{StorageBackend, StorageContext};

/// Test context for GroupStore scenarios.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct GroupStoreWorld {
    backend: StorageBackend,
    context: Option<StorageContext>,
    first_created_at: Option<String>,
    last_error: Option<StorageError>,
}

impl GroupStoreWorld {
    fn new() -> Self {
        Self {
            backend: StorageBackend::from_env(),
            context: None,
            first_created_at: None,
            last_error: None,
        }
    }

    fn stores(&self) -> &Stores {
        self.context
            .as_ref()
            .expect("Storage context not initialized")
            .stores()
    }
}

// --- Background ---

#[given("a GroupStore backend")]
async fn given_group_store_backend(world: &mut GroupStoreWorld) {
    println!("Using backend: {}", world.backend.name());
    let mut ctx = StorageContext::new(world.backend).await;
    ctx.init().await;
    world.context = Some(ctx);
}

// --- Given steps ---

#[given(expr = "group {string} named {string}")]
async fn given_group(world: &mut GroupStoreWorld, id: String, name: String) {
    world
        .stores()
        .groups
        .upsert_group(&GroupUpsert::new(id.as_str(), name))
        .await
        .expect("Failed to upsert group");

    if world.first_created_at.is_none() {
        let record = world.stores().groups.get(&id).await.unwrap().unwrap();
        world.first_created_at = Some(record.created_at);
    }
}

// --- When steps ---

#[when(expr = "I upsert group {string} named {string}")]
async fn when_upsert_group(world: &mut GroupStoreWorld, id: String, name: String) {
    match world
        .stores()
        .groups
        .upsert_group(&GroupUpsert::new(id, name))
        .await
    {
        Ok(()) => world.last_error = None,
        Err(e) => world.last_error = Some(e),
    }
}

// --- Then steps ---

#[then(expr = "group {string} is named {string}")]
async fn then_group_named(world: &mut GroupStoreWorld, id: String, name: String) {
    let record = world
        .stores()
        .groups
        .get(&id)
        .await
        .expect("Failed to get group")
        .expect("Group should exist");
    assert_eq!(record.name, name);
}

#[then(expr = "group {string} kept its creation time")]
async fn then_group_kept_created_at(world: &mut GroupStoreWorld, id: String) {
    let record = world.stores().groups.get(&id).await.unwrap().unwrap();
    assert_eq!(
        Some(record.created_at.as_str()),
        world.first_created_at.as_deref()
    );
}

#[then(expr = "group {string} does not exist")]
async fn then_group_absent(world: &mut GroupStoreWorld, id: String) {
    let record = world.stores().groups.get(&id).await.expect("Failed to get group");
    assert!(record.is_none(), "expected no group, got {:?}", record);
}

#[then(regex = r"^there (?:is|are) (\d+) groups?$")]
async fn then_group_count(world: &mut GroupStoreWorld, expected: usize) {
    let groups = world.stores().groups.list().await.expect("Failed to list groups");
    assert_eq!(groups.len(), expected);
}

#[then("the operation fails with invalid input")]
async fn then_invalid_input(world: &mut GroupStoreWorld) {
    match &world.last_error {
        Some(StorageError::InvalidInput(_)) => {}
        other => panic!("expected invalid input error, got {:?}", other),
    }
}
