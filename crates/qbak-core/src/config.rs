use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{QbakError, QbakResult};

/// Retention value that disables rotation of old backups
pub const RETENTION_DISABLED: i64 = -1;

/// Persisted backup configuration (TOML, stored obscured as config.bc)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Base64 ML-KEM-1024 public key used to seal every backup
    pub key: String,
    /// Files and folders to back up
    pub paths: Vec<String>,
    /// Max amount of backups kept in `destination` (-1 disables rotation)
    pub retention: i64,
    /// Folder where backups are written
    pub destination: PathBuf,
    pub compression: CompressionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// zstd level (default: 7)
    pub level: i32,
    /// Compression worker threads (0 or 1 = compress on the calling thread)
    pub workers: u32,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            paths: Vec::new(),
            retention: 5,
            destination: PathBuf::from("data/"),
            compression: CompressionConfig::default(),
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            level: 7,
            workers: 4,
        }
    }
}

impl BackupConfig {
    /// Default configuration carrying a freshly generated public key
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Parse the plaintext TOML form.
    pub fn from_toml(text: &str) -> QbakResult<Self> {
        toml::from_str(text).map_err(|e| QbakError::InvalidConfig(e.to_string()))
    }

    /// Render the plaintext TOML form.
    pub fn to_toml(&self) -> QbakResult<String> {
        toml::to_string_pretty(self).map_err(|e| QbakError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> QbakResult<()> {
        validate_retention(self.retention)
    }
}

/// Retention must be a positive count, or -1 to keep everything.
pub fn validate_retention(value: i64) -> QbakResult<()> {
    if value == 0 || value < RETENTION_DISABLED {
        return Err(QbakError::InvalidRetentionValue(value));
    }
    Ok(())
}
