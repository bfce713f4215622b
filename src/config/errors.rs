/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for platform configuration

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for environment variable {name}: {message}")]
    Environment { name: String, message: String },
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
