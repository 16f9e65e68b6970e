//! GroupStore interface tests.
//!
//! These tests verify the upsert contract against a real adapter. Each test
//! uses its own group ids so they can share one database.

use chatvault::storage::{GroupUpsert, StorageError};
use chatvault::store::Stores;

pub async fn test_upsert_inserts_new_group(stores: &Stores) {
    let id = "test_group_insert";

    stores
        .groups
        .upsert_group(&GroupUpsert::new(id, "Family"))
        .await
        .expect("upsert should succeed");

    let row = stores
        .groups
        .get(id)
        .await
        .expect("get should succeed")
        .expect("group should exist");
    assert_eq!(row.name, "Family");
    assert_eq!(row.created_at, row.updated_at);
    assert!(row.deleted_at.is_none());
}

pub async fn test_upsert_overwrites_name_keeps_created_at(stores: &Stores) {
    let id = "test_group_rename";

    stores
        .groups
        .upsert_group(&GroupUpsert::new(id, "A"))
        .await
        .expect("first upsert should succeed");
    let before = stores.groups.get(id).await.unwrap().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    stores
        .groups
        .upsert_group(&GroupUpsert::new(id, "B"))
        .await
        .expect("second upsert should succeed");
    let after = stores.groups.get(id).await.unwrap().unwrap();

    assert_eq!(after.name, "B");
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);
}

pub async fn test_upsert_is_idempotent(stores: &Stores) {
    let id = "test_group_idempotent";

    for _ in 0..3 {
        stores
            .groups
            .upsert_group(&GroupUpsert::new(id, "Same"))
            .await
            .expect("upsert should succeed");
    }

    let matching = stores
        .groups
        .list()
        .await
        .expect("list should succeed")
        .into_iter()
        .filter(|g| g.id == id)
        .count();
    assert_eq!(matching, 1);
}

pub async fn test_upsert_rejects_empty_id(stores: &Stores) {
    let result = stores.groups.upsert_group(&GroupUpsert::new("", "X")).await;
    assert!(matches!(result, Err(StorageError::InvalidInput(_))));
}

pub async fn test_get_missing_group(stores: &Stores) {
    let row = stores
        .groups
        .get("test_group_missing")
        .await
        .expect("get should succeed");
    assert!(row.is_none());
}

pub async fn test_list_orders_by_name_then_id(stores: &Stores) {
    for (id, name) in [
        ("test_group_order_2", "zz-order"),
        ("test_group_order_3", "zy-order"),
        ("test_group_order_1", "zz-order"),
    ] {
        stores
            .groups
            .upsert_group(&GroupUpsert::new(id, name))
            .await
            .expect("upsert should succeed");
    }

    let ids: Vec<String> = stores
        .groups
        .list()
        .await
        .expect("list should succeed")
        .into_iter()
        .filter(|g| g.id.starts_with("test_group_order_"))
        .map(|g| g.id)
        .collect();
    assert_eq!(
        ids,
        vec!["test_group_order_3", "test_group_order_1", "test_group_order_2"]
    );
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all GroupStore interface tests against a store bundle.
#[macro_export]
macro_rules! run_group_store_tests {
    ($stores:expr) => {
        use $crate::storage::group_store_tests::*;

        test_upsert_inserts_new_group($stores).await;
        println!("  test_upsert_inserts_new_group: PASSED");

        test_upsert_overwrites_name_keeps_created_at($stores).await;
        println!("  test_upsert_overwrites_name_keeps_created_at: PASSED");

        test_upsert_is_idempotent($stores).await;
        println!("  test_upsert_is_idempotent: PASSED");

        test_upsert_rejects_empty_id($stores).await;
        println!("  test_upsert_rejects_empty_id: PASSED");

        test_get_missing_group($stores).await;
        println!("  test_get_missing_group: PASSED");

        test_list_orders_by_name_then_id($stores).await;
        println!("  test_list_orders_by_name_then_id: PASSED");
    };
}
