//! Configuration system for Perco.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $PERCO_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/perco/config.toml
//!   3. ~/.config/perco/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PercoConfig {
    pub dispatch: DispatchSettings,
    pub limits: LimitSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Max shard executions in flight at once. 0 = one task per shard.
    pub max_concurrent_shards: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    /// Reject requests whose payload exceeds this many bytes. 0 = unlimited.
    /// Enforced by the dispatcher before fan-out; the request itself stays
    /// a plain value and is never size-checked at construction.
    pub max_payload_bytes: u64,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_concurrent_shards: 0,
        }
    }
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_payload_bytes: 0,
        }
    }
}

// ── Path helpers ─────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_or_tmp().join(".config"))
        .join("perco")
}

fn home_or_tmp() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ──────────────────────────────────────────────────────────────────

impl PercoConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            PercoConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("PERCO_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&PercoConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply PERCO_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PERCO_DISPATCH__MAX_CONCURRENT_SHARDS") {
            if let Ok(n) = v.parse() {
                self.dispatch.max_concurrent_shards = n;
            }
        }
        if let Ok(v) = std::env::var("PERCO_LIMITS__MAX_PAYLOAD_BYTES") {
            if let Ok(n) = v.parse() {
                self.limits.max_payload_bytes = n;
            }
        }
    }
}
