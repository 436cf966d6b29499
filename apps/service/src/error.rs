use std::io::Error as IoError;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to persist the status store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write status store {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: IoError,
    },
    #[error("failed to encode status store: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure to load the list of monitored targets
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read target registry {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: IoError,
    },
    #[error("failed to parse target registry {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure to deliver an alert. Always logged, never retried.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("notification endpoint answered {0}")]
    Rejected(reqwest::StatusCode),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: IoError,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: IoError,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("no config directory: neither XDG_CONFIG_HOME nor HOME is set")]
    ConfigPathUnavailable,
    #[error("invalid config: {0}")]
    Invalid(String),
}
