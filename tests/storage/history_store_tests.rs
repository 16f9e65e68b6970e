//! HistoryStore interface tests.
//!
//! These tests verify the change-detection gate and append-only history.

use chatvault::storage::GroupSnapshot;
use chatvault::store::Stores;

fn snapshot(group: &str, name: &str, users_count: i64) -> GroupSnapshot {
    GroupSnapshot::new(group)
        .with_name(name)
        .with_users_count(users_count)
}

pub async fn test_first_snapshot_is_written(stores: &Stores) {
    let group = "test_hist_first";

    let written = stores
        .history
        .insert_snapshot_if_changed(snapshot(group, "Team", 4).with_description("weekly"))
        .await
        .expect("gate should succeed");
    assert!(written);

    let latest = stores
        .history
        .latest(group)
        .await
        .expect("latest should succeed")
        .expect("row should exist");
    assert_eq!(latest.name.as_deref(), Some("Team"));
    assert_eq!(latest.users_count, Some(4));
    assert_eq!(latest.description.as_deref(), Some("weekly"));
    assert_eq!(latest.created_at, latest.updated_at);
}

pub async fn test_change_gate_three_calls_two_rows(stores: &Stores) {
    let group = "test_hist_gate";

    let results = [
        stores.history.insert_snapshot_if_changed(snapshot(group, "A", 5)).await,
        stores.history.insert_snapshot_if_changed(snapshot(group, "A", 5)).await,
        stores.history.insert_snapshot_if_changed(snapshot(group, "A", 6)).await,
    ];
    let written: Vec<bool> = results
        .into_iter()
        .map(|r| r.expect("gate should succeed"))
        .collect();
    assert_eq!(written, vec![true, false, true]);

    let rows = stores.history.history(group).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].users_count, Some(5));
    assert_eq!(rows[1].users_count, Some(6));
    assert!(rows[0].id < rows[1].id);
}

pub async fn test_each_tracked_attribute_detected(stores: &Stores) {
    let group = "test_hist_attrs";
    let base = snapshot(group, "A", 1).with_description("d");

    let sequence = [
        base.clone(),
        base.clone().with_name("B"),
        base.clone().with_name("B").with_users_count(2),
        base.clone()
            .with_name("B")
            .with_users_count(2)
            .with_description("changed"),
    ];
    for s in sequence {
        assert!(stores.history.insert_snapshot_if_changed(s).await.unwrap());
    }
    assert_eq!(stores.history.history(group).await.unwrap().len(), 4);
}

pub async fn test_absent_attributes_compare_equal(stores: &Stores) {
    let group = "test_hist_absent";

    assert!(stores
        .history
        .insert_snapshot_if_changed(GroupSnapshot::new(group))
        .await
        .unwrap());
    assert!(!stores
        .history
        .insert_snapshot_if_changed(GroupSnapshot::new(group).with_name("").with_description(""))
        .await
        .unwrap());

    let latest = stores.history.latest(group).await.unwrap().unwrap();
    assert_eq!(latest.name, None);
    assert_eq!(latest.users_count, None);
}

pub async fn test_groups_are_independent(stores: &Stores) {
    let a = "test_hist_indep_a";
    let b = "test_hist_indep_b";

    assert!(stores.history.insert_snapshot_if_changed(snapshot(a, "X", 1)).await.unwrap());
    assert!(stores.history.insert_snapshot_if_changed(snapshot(b, "X", 1)).await.unwrap());
    assert!(!stores.history.insert_snapshot_if_changed(snapshot(a, "X", 1)).await.unwrap());
}

pub async fn test_unconditional_insert_returns_increasing_ids(stores: &Stores) {
    let group = "test_hist_raw";

    let first = stores
        .history
        .insert_snapshot(&snapshot(group, "A", 1))
        .await
        .expect("insert should succeed");
    let second = stores
        .history
        .insert_snapshot(&snapshot(group, "A", 1))
        .await
        .expect("insert should succeed");

    assert!(second > first);
    let latest = stores.history.latest(group).await.unwrap().unwrap();
    assert_eq!(latest.id, second);
}

pub async fn test_latest_for_unknown_group(stores: &Stores) {
    let latest = stores
        .history
        .latest("test_hist_unknown")
        .await
        .expect("latest should succeed");
    assert!(latest.is_none());
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all HistoryStore interface tests against a store bundle.
#[macro_export]
macro_rules! run_history_store_tests {
    ($stores:expr) => {
        use $crate::storage::history_store_tests::*;

        test_first_snapshot_is_written($stores).await;
        println!("  test_first_snapshot_is_written: PASSED");

        test_change_gate_three_calls_two_rows($stores).await;
        println!("  test_change_gate_three_calls_two_rows: PASSED");

        test_each_tracked_attribute_detected($stores).await;
        println!("  test_each_tracked_attribute_detected: PASSED");

        test_absent_attributes_compare_equal($stores).await;
        println!("  test_absent_attributes_compare_equal: PASSED");

        test_groups_are_independent($stores).await;
        println!("  test_groups_are_independent: PASSED");

        test_unconditional_insert_returns_increasing_ids($stores).await;
        println!("  test_unconditional_insert_returns_increasing_ids: PASSED");

        test_latest_for_unknown_group($stores).await;
        println!("  test_latest_for_unknown_group: PASSED");
    };
}
