//! Error types for the config module.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    ReadFailure {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot parse config file {path}: {source}")]
    ParseFailure {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Account not found in account directory: {0}")]
    AccountNotFound(String),

    #[error("Config directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl ConfigError {
    /// Whether the document itself could not be read or parsed.
    pub fn is_read_failure(&self) -> bool {
        matches!(
            self,
            ConfigError::ReadFailure { .. } | ConfigError::ParseFailure { .. }
        )
    }
}
