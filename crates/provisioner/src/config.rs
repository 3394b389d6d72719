//! Configuration types for provisioning runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declared width of the `uuid` key column, in bytes.
pub const KEY_COLUMN_CAPACITY: usize = 192;

/// Declared width of the `data` payload column, in bytes.
pub const PAYLOAD_COLUMN_CAPACITY: usize = 60_000;

/// Length of a generated row key.
pub const KEY_LEN: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Payload floor must be at least 1 byte")]
    EmptyPayload,
    #[error("Payload floor {min} exceeds payload ceiling {max}")]
    InvertedPayloadRange { min: usize, max: usize },
    #[error("Payload ceiling {max} exceeds column capacity {capacity}")]
    PayloadTooLarge { max: usize, capacity: usize },
    #[error("Batch size must be at least 1")]
    EmptyBatch,
    #[error("No tables configured")]
    NoTables,
    #[error("Invalid PROVISION_SEED '{0}'")]
    InvalidSeed(String),
}

/// Where and as whom to connect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    /// Bare user name; the server is expected to accept it without a password.
    pub user: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Connection URL understood by the MySQL driver.
    pub fn url(&self) -> String {
        format!("mysql://{}@{}:{}", self.user, self.host, self.port)
    }
}

/// Configuration for a provisioning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    pub connection: ConnectionConfig,

    /// Database names are `{database_prefix}{n}` for `n in 0..database_count`.
    pub database_prefix: String,
    pub database_count: usize,

    /// Tables created inside every database.
    pub tables: Vec<String>,

    /// Rows per insert statement (and per commit).
    pub batch_size: usize,

    /// Number of batches inserted into each table.
    pub batches: usize,

    /// Inclusive payload size bounds, in bytes.
    pub min_payload: usize,
    pub max_payload: usize,

    /// Fixed RNG seed for reproducible data. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            database_prefix: "production_env".to_string(),
            database_count: 100,
            tables: vec!["delivs_2024_10".to_string()],
            batch_size: 10,
            batches: 100,
            min_payload: 1024,
            max_payload: 32 * 1024,
            seed: None,
        }
    }
}

impl ProvisionConfig {
    /// Defaults with `PROVISION_SEED` applied when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(seed) = lookup("PROVISION_SEED") {
            let parsed = seed
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidSeed(seed.clone()))?;
            config.seed = Some(parsed);
        }
        Ok(config)
    }

    /// Checks that generated rows will fit the table schema.
    ///
    /// Inserts fail at the server if the payload ceiling is larger than the
    /// declared column, so this is checked before any statement runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_payload == 0 {
            return Err(ConfigError::EmptyPayload);
        }
        if self.min_payload > self.max_payload {
            return Err(ConfigError::InvertedPayloadRange {
                min: self.min_payload,
                max: self.max_payload,
            });
        }
        if self.max_payload > PAYLOAD_COLUMN_CAPACITY {
            return Err(ConfigError::PayloadTooLarge {
                max: self.max_payload,
                capacity: PAYLOAD_COLUMN_CAPACITY,
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::EmptyBatch);
        }
        if self.tables.is_empty() {
            return Err(ConfigError::NoTables);
        }
        Ok(())
    }

    /// Rows each table holds after a complete run.
    pub fn rows_per_table(&self) -> usize {
        self.batch_size * self.batches
    }
}
