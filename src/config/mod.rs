//! Application configuration.
//!
//! Loaded from YAML files and environment variables, with the variables of
//! earlier deployments applied on top.

mod storage;

pub use storage::{EmbeddedConfig, NetworkedConfig, StorageConfig, StorageType};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "CHATVAULT_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "CHATVAULT";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "CHATVAULT_LOG";
/// Fallback logging variable of earlier deployments.
pub const LEGACY_LOG_ENV_VAR: &str = "LOG_LEVEL";
/// Environment variable selecting `text` or `json` log output.
pub const LOG_FORMAT_ENV_VAR: &str = "CHATVAULT_LOG_FORMAT";

use serde::Deserialize;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `config.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    /// 5. Legacy `DB_*` / `PG*` variables
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Config = config.try_deserialize()?;
        config
            .storage
            .apply_legacy_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Create config for testing: embedded storage at `path`.
    pub fn for_test(path: &str) -> Self {
        let mut config = Self::default();
        config.storage.embedded.path = path.to_string();
        config
    }
}
