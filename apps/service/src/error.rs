//! Error types for the pingo core.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("Probe could not be executed: {reason}")]
    ProbeExecution { reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] libsql::Error),

    #[error("Connection pool error: {reason}")]
    Pool { reason: String },

    #[error("Migration to schema v{version} failed: {reason}")]
    Migration { version: i64, reason: String },

    #[error("Corrupt record: {reason}")]
    CorruptRecord { reason: String },

    #[error("Invalid time format {value:?}: expected {expected}")]
    InvalidTimeFormat { value: String, expected: &'static str },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Malformed or swapped query bounds, the only error that is the caller's fault.
    pub fn is_invalid_time_format(&self) -> bool {
        matches!(self, Error::InvalidTimeFormat { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Neither XDG base directories nor $HOME are available")]
    ConfigPathUnavailable,
}
