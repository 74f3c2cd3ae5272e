use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ShredError, ShredResult};

/// Top-level configuration (loaded from shred.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShredConfig {
    pub crypto: CryptoConfig,
    pub keystore: KeyStoreConfig,
}

impl ShredConfig {
    /// Load and validate a TOML configuration file.
    pub fn load(path: &Path) -> ShredResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML configuration string.
    pub fn from_toml(content: &str) -> ShredResult<Self> {
        let config: ShredConfig =
            toml::from_str(content).map_err(|e| ShredError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ShredResult<()> {
        if self.crypto.default_scheme.trim().is_empty() {
            return Err(ShredError::Config(
                "crypto.default_scheme must not be empty".into(),
            ));
        }
        if self.keystore.backend == KeyStoreBackendKind::Json && self.keystore.path.is_none() {
            return Err(ShredError::Config(
                "keystore.path is required for the json backend".into(),
            ));
        }
        Ok(())
    }
}

/// Encryption settings applied when a subject's key material is provisioned
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Scheme used for newly provisioned subjects (default: aes256gcm)
    pub default_scheme: String,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            default_scheme: "aes256gcm".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStoreBackendKind {
    /// Process-local map; key material is lost on exit
    #[default]
    Memory,
    /// JSON file, rewritten atomically on every mutation
    Json,
}

/// Key repository settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyStoreConfig {
    pub backend: KeyStoreBackendKind,
    /// Key store file path (json backend only)
    pub path: Option<PathBuf>,
}
