//! Storage configuration
//!
//! Selects the subscription store backend and carries the settings each
//! backend needs.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::error::ValidationError;

/// Which adapter persists subscription records.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local map; state is lost on restart.
    #[default]
    Memory,
    /// One JSON document per subscriber under `data_dir`.
    File,
    Postgres,
    Redis,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory for the file backend
    pub data_dir: Option<PathBuf>,

    /// PostgreSQL connection URL
    pub database_url: Option<String>,

    /// Maximum pooled PostgreSQL connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Redis connection URL
    pub redis_url: Option<String>,

    /// Redis key namespace
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Compare-and-swap attempts before reporting a write conflict
    #[serde(default = "default_max_write_attempts")]
    pub max_write_attempts: u32,
}

const REDEMPTIONS_DIR: &str = "checkout_redemptions";

impl StorageConfig {
    /// Redis namespace for redeemed checkout sessions. Kept apart from
    /// `key_prefix` because subscriber ids may themselves contain `:`.
    pub fn redemption_key_prefix(&self) -> String {
        format!("{}-redemption", self.key_prefix)
    }

    /// Directory the file backend keeps redeemed checkout sessions in.
    pub fn redemption_dir(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(REDEMPTIONS_DIR)
    }

    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_write_attempts == 0 || self.max_write_attempts > 10 {
            return Err(ValidationError::InvalidWriteAttempts);
        }

        match self.backend {
            StorageBackend::Memory => {}
            StorageBackend::File => {
                if self.data_dir.as_ref().map_or(true, |d| d.as_os_str().is_empty()) {
                    return Err(ValidationError::MissingRequired("STORAGE__DATA_DIR"));
                }
            }
            StorageBackend::Postgres => {
                let url = non_empty(&self.database_url)
                    .ok_or(ValidationError::MissingRequired("STORAGE__DATABASE_URL"))?;
                if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                    return Err(ValidationError::InvalidDatabaseUrl);
                }
                if self.max_connections == 0 || self.max_connections > 100 {
                    return Err(ValidationError::InvalidPoolSize);
                }
            }
            StorageBackend::Redis => {
                let url = non_empty(&self.redis_url)
                    .ok_or(ValidationError::MissingRequired("STORAGE__REDIS_URL"))?;
                if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                    return Err(ValidationError::InvalidRedisUrl);
                }
            }
        }
        Ok(())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: None,
            database_url: None,
            max_connections: default_max_connections(),
            redis_url: None,
            key_prefix: default_key_prefix(),
            max_write_attempts: default_max_write_attempts(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_key_prefix() -> String {
    "research_pilot:subscription".to_string()
}

fn default_max_write_attempts() -> u32 {
    3
}
