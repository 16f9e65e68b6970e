//! MessageStore interface tests.
//!
//! These tests verify write-once message persistence.

use chatvault::storage::{NewMessage, StorageError};
use chatvault::store::Stores;

pub async fn test_insert_new_message(stores: &Stores) {
    let group = "test_msg_insert";

    let written = stores
        .messages
        .insert_message_if_absent(
            NewMessage::new("test_msg_insert_1", group, 1_700_000_000)
                .with_user("u1")
                .with_body("hello")
                .with_type("chat")
                .with_metadata(r#"{"hasMedia":false}"#),
        )
        .await
        .expect("insert should succeed");
    assert!(written);

    let rows = stores.messages.list(group, 10).await.expect("list should succeed");
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.user_id.as_deref(), Some("u1"));
    assert_eq!(row.body.as_deref(), Some("hello"));
    assert_eq!(row.message_type.as_deref(), Some("chat"));
    assert_eq!(row.timestamp, Some(1_700_000_000));
    assert_eq!(row.metadata_blob.as_deref(), Some(r#"{"hasMedia":false}"#));
    assert_eq!(row.created_at, row.updated_at);
}

pub async fn test_duplicate_message_is_noop(stores: &Stores) {
    let group = "test_msg_dup";
    let id = "test_msg_dup_1";

    let first = stores
        .messages
        .insert_message_if_absent(NewMessage::new(id, group, 10).with_body("original"))
        .await
        .expect("first insert should succeed");
    let second = stores
        .messages
        .insert_message_if_absent(NewMessage::new(id, group, 20).with_body("redelivered"))
        .await
        .expect("duplicate insert should not error");

    assert!(first);
    assert!(!second);

    let rows = stores.messages.list(group, 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].body.as_deref(), Some("original"));
    assert_eq!(rows[0].timestamp, Some(10));
}

pub async fn test_message_for_unknown_group(stores: &Stores) {
    let written = stores
        .messages
        .insert_message_if_absent(NewMessage::new("test_msg_orphan_1", "test_msg_no_such_group", 1))
        .await
        .expect("group references are not enforced");
    assert!(written);
}

pub async fn test_empty_optional_text_is_null(stores: &Stores) {
    let group = "test_msg_empty";

    stores
        .messages
        .insert_message_if_absent(
            NewMessage::new("test_msg_empty_1", group, 1)
                .with_body("")
                .with_user("")
                .with_type(""),
        )
        .await
        .expect("insert should succeed");

    let rows = stores.messages.list(group, 10).await.unwrap();
    assert_eq!(rows[0].body, None);
    assert_eq!(rows[0].user_id, None);
    assert_eq!(rows[0].message_type, None);
    assert_eq!(rows[0].metadata_blob, None);
}

pub async fn test_required_ids(stores: &Stores) {
    let no_id = stores
        .messages
        .insert_message_if_absent(NewMessage::new("", "test_msg_required", 1))
        .await;
    let no_group = stores
        .messages
        .insert_message_if_absent(NewMessage::new("test_msg_required_1", "", 1))
        .await;

    assert!(matches!(no_id, Err(StorageError::InvalidInput(_))));
    assert!(matches!(no_group, Err(StorageError::InvalidInput(_))));
}

pub async fn test_list_orders_by_timestamp_and_limits(stores: &Stores) {
    let group = "test_msg_order";

    for (id, ts) in [("c", 30), ("a", 10), ("b", 20), ("a2", 10)] {
        stores
            .messages
            .insert_message_if_absent(NewMessage::new(format!("test_msg_order_{}", id), group, ts))
            .await
            .expect("insert should succeed");
    }

    let ids: Vec<String> = stores
        .messages
        .list(group, 3)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(
        ids,
        vec!["test_msg_order_a", "test_msg_order_a2", "test_msg_order_b"]
    );
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all MessageStore interface tests against a store bundle.
#[macro_export]
macro_rules! run_message_store_tests {
    ($stores:expr) => {
        use $crate::storage::message_store_tests::*;

        test_insert_new_message($stores).await;
        println!("  test_insert_new_message: PASSED");

        test_duplicate_message_is_noop($stores).await;
        println!("  test_duplicate_message_is_noop: PASSED");

        test_message_for_unknown_group($stores).await;
        println!("  test_message_for_unknown_group: PASSED");

        test_empty_optional_text_is_null($stores).await;
        println!("  test_empty_optional_text_is_null: PASSED");

        test_required_ids($stores).await;
        println!("  test_required_ids: PASSED");

        test_list_orders_by_timestamp_and_limits($stores).await;
        println!("  test_list_orders_by_timestamp_and_limits: PASSED");
    };
}
