//! chatvault: event ingestion into durable storage
//!
//! Reads newline-delimited JSON events on stdin and persists them through the
//! configured storage engine.
//!
//! ## Configuration
//! - `--config <path>` / CHATVAULT_CONFIG: YAML configuration file
//! - CHATVAULT__STORAGE__TYPE: `embedded` (default) or `networked`
//! - DB_CLIENT, DB_PATH, PG*: variables of earlier deployments
//! - CHATVAULT_LOG / LOG_LEVEL: log filter, CHATVAULT_LOG_FORMAT: `text` or `json`
//!
//! ## Events
//! ```text
//! {"event":"group_seen","id":"g1","name":"Team"}
//! {"event":"message","group":{"id":"g1","name":"Team"},"id":"m1","body":"hi","timestamp":1700000000}
//! {"event":"group_metadata","id":"g1","name":"Team","users_count":12}
//! ```

use tokio::io::BufReader;
use tracing::{error, info};

use chatvault::config::Config;
use chatvault::ingest::Ingestor;
use chatvault::storage::init_storage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    chatvault::utils::bootstrap::init_tracing();

    let config_path = chatvault::utils::bootstrap::parse_config_path();
    let config = Config::load(config_path.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(backend = %config.storage.storage_type, "Starting chatvault");

    let backend = init_storage(&config.storage).await.map_err(|e| {
        error!(error = %e, "Storage initialization failed");
        e
    })?;
    info!(dispatch = ?backend.dispatch_mode(), "Storage initialized");

    let ingestor = Ingestor::from_backend(backend, &config.storage);
    let ingested = ingestor
        .ingest_lines(BufReader::new(tokio::io::stdin()))
        .await;
    // Dispatched writes are awaited even when reading stdin failed.
    ingestor.drain().await;
    let stats = ingested.map_err(|e| {
        error!(error = %e, "Failed to read events from stdin");
        e
    })?;

    info!(
        events = stats.events,
        malformed = stats.malformed,
        failed = stats.failed,
        "Input exhausted, shutting down"
    );
    Ok(())
}
