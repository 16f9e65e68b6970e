//! Interface tests for storage backends using Cucumber.
//!
//! These tests verify that both storage engines conform to the same contract.
//! Select a backend via environment variable:
//!
//! ```bash
//! # SQLite (default)
//! cargo test --test interfaces --features sqlite
//!
//! # PostgreSQL (uses testcontainers)
//! STORAGE_BACKEND=postgres cargo test --test interfaces --features postgres
//! ```

mod steps;

use cucumber::World;
use steps::groups::GroupStoreWorld;
use steps::history::HistoryStoreWorld;
use steps::messages::MessageStoreWorld;
use steps::schema::SchemaWorld;

#[tokio::main]
async fn main() {
    // Run GroupStore tests
    println!("\n=== Running GroupStore Interface Tests ===\n");
    GroupStoreWorld::cucumber()
        .fail_on_skipped()
        .run("tests/interfaces/features/groups.feature")
        .await;

    // Run MessageStore tests
    println!("\n=== Running MessageStore Interface Tests ===\n");
    MessageStoreWorld::cucumber()
        .fail_on_skipped()
        .run("tests/interfaces/features/messages.feature")
        .await;

    // Run HistoryStore tests
    println!("\n=== Running HistoryStore Interface Tests ===\n");
    HistoryStoreWorld::cucumber()
        .fail_on_skipped()
        .run("tests/interfaces/features/history.feature")
        .await;

    // Run schema migration tests
    println!("\n=== Running Schema Interface Tests ===\n");
    SchemaWorld::cucumber()
        .fail_on_skipped()
        .run("tests/interfaces/features/schema.feature")
        .await;
}
