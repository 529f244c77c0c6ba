//! Configuration management for taskgraph.
//!
//! Configuration lives in a YAML file:
//!
//! ```yaml
//! server:
//!   bind: 127.0.0.1:8080
//!   max-body-bytes: 65536
//! snapshot:
//!   path: tasks.jsonl
//! ```
//!
//! Every field has a default, so an empty file is a valid configuration.
//! Command-line flags override file values.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default name of the configuration file
pub const CONFIG_FILE_NAME: &str = "taskgraph.yaml";

/// Default address the HTTP service listens on
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Default snapshot file
pub const DEFAULT_SNAPSHOT_FILE: &str = "tasks.jsonl";

/// Default request body limit in bytes
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TaskgraphConfig {
    /// HTTP service settings
    pub server: ServerConfig,

    /// Snapshot source settings
    pub snapshot: SnapshotConfig,
}

/// HTTP service section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Address to listen on (`host:port`)
    pub bind: String,

    /// Requests with a larger body are rejected before parsing
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Snapshot section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Path to the task snapshot file (JSON Lines or JSON array)
    pub path: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
        }
    }
}

impl TaskgraphConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Config` if
    /// it is not valid configuration.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration if the file exists, defaults otherwise
    ///
    /// # Errors
    ///
    /// Same as [`TaskgraphConfig::load`] for an existing file.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if fs::try_exists(path).await? {
            Self::load(path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let yaml =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {}", e)))?;
        fs::write(path, yaml).await?;
        Ok(())
    }

    /// Check values that parse but cannot work.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an empty bind address or a zero body limit.
    pub fn validate(&self) -> Result<()> {
        if self.server.bind.trim().is_empty() {
            return Err(Error::Config("server.bind cannot be empty".to_string()));
        }
        if self.server.max_body_bytes == 0 {
            return Err(Error::Config(
                "server.max-body-bytes must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
