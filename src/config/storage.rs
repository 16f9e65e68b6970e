//! Storage configuration types.

use serde::Deserialize;

/// Storage type discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Single-file SQLite database.
    #[default]
    #[serde(alias = "sqlite")]
    Embedded,
    /// PostgreSQL over a connection pool.
    #[serde(alias = "postgres", alias = "postgresql")]
    Networked,
}

impl StorageType {
    /// Parse the names accepted in configuration and legacy variables.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "embedded" | "sqlite" => Some(StorageType::Embedded),
            "networked" | "postgres" | "postgresql" => Some(StorageType::Networked),
            _ => None,
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::Embedded => f.write_str("embedded"),
            StorageType::Networked => f.write_str("networked"),
        }
    }
}

/// Storage configuration (discriminated union).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage type discriminator.
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// Embedded engine configuration.
    pub embedded: EmbeddedConfig,
    /// Networked engine configuration.
    pub networked: NetworkedConfig,
    /// Per-call timeout applied to every store operation.
    pub operation_timeout_ms: u64,
    /// Hold a per-group lock across the snapshot read-decide-write sequence.
    pub serialize_snapshots: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Embedded,
            embedded: EmbeddedConfig::default(),
            networked: NetworkedConfig::default(),
            operation_timeout_ms: 5000,
            serialize_snapshots: false,
        }
    }
}

impl StorageConfig {
    pub fn operation_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.operation_timeout_ms)
    }

    /// Apply the environment variables used by earlier deployments.
    ///
    /// `lookup` resolves a variable name; unset or unparsable values leave
    /// the current setting untouched.
    pub fn apply_legacy_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(storage_type) = lookup("DB_CLIENT").and_then(|v| StorageType::parse(&v)) {
            self.storage_type = storage_type;
        }
        if let Some(path) = lookup("DB_PATH") {
            self.embedded.path = path;
        }
        if let Some(host) = lookup("PGHOST") {
            self.networked.host = host;
        }
        if let Some(port) = lookup("PGPORT").and_then(|v| v.parse().ok()) {
            self.networked.port = port;
        }
        if let Some(database) = lookup("PGDATABASE") {
            self.networked.database = database;
        }
        if let Some(user) = lookup("PGUSER") {
            self.networked.user = user;
        }
        if let Some(password) = lookup("PGPASSWORD") {
            self.networked.password = Some(password);
        }
        if let Some(ssl) = lookup("PGSSL") {
            self.networked.tls = ssl == "true";
        }
        if let Some(max) = lookup("PGPOOL_MAX").and_then(|v| v.parse().ok()) {
            self.networked.max_connections = max;
        }
    }
}

/// Embedded (SQLite) configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddedConfig {
    /// Path to the database file.
    pub path: String,
    /// How long a connection waits on a locked database.
    pub busy_timeout_ms: u64,
    /// Connections in the in-process pool.
    pub max_connections: u32,
}

impl Default for EmbeddedConfig {
    fn default() -> Self {
        Self {
            path: "./data/chatvault.sqlite".to_string(),
            busy_timeout_ms: 30_000,
            max_connections: 5,
        }
    }
}

/// Networked (PostgreSQL) configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkedConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
    /// Require TLS on connections.
    pub tls: bool,
    /// Maximum pool size.
    pub max_connections: u32,
    /// How long a caller waits for a pooled connection.
    pub acquire_timeout_ms: u64,
}

impl Default for NetworkedConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "chatvault".to_string(),
            user: "chatvault".to_string(),
            password: None,
            tls: false,
            max_connections: 10,
            acquire_timeout_ms: 30_000,
        }
    }
}
