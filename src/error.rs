//! Error types for the input bridge.
//!
//! None of these cross a per-frame call path. Host failures are swallowed
//! where they are observed and only logged at debug level.

use std::path::PathBuf;

use thiserror::Error;

/// Errors while loading configuration. Callers usually fall back to
/// [`BridgeConfig::default`](crate::config::BridgeConfig::default).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No config directory available on this platform")]
    NoConfigDir,
}

/// Errors reported by the host facade.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The host refused the action, e.g. not enough resources to build.
    #[error("Host rejected action: {0}")]
    Rejected(String),

    /// The entity the action referred to no longer exists.
    #[error("Entity {0} is gone")]
    EntityGone(u64),
}

/// Errors while creating a hardware source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to initialize input backend: {0}")]
    Initialization(String),
}
