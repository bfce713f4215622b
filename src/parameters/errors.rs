/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the parameters module

use crate::s2e::S2eError;
use crate::sample::SampleError;
use crate::utils::UtilsError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or validating parameter objects
#[derive(Debug, Error)]
pub enum ParametersError {
    #[error("Unknown parameter(s): {0}")]
    UnknownKey(String),

    #[error("Parameter '{key}' must be {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Conflicting parameters: {0}")]
    Conflict(String),

    #[error("File not found: {0}")]
    MissingFile(PathBuf),

    #[error("No beam parameters available: {0}")]
    MissingBeam(String),

    #[error("Geometry parse error at line {line}: {message}")]
    GeometryParse { line: usize, message: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Quantity(#[from] UtilsError),

    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error(transparent)]
    S2e(#[from] S2eError),
}

impl ParametersError {
    pub(crate) fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        ParametersError::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type for parameter operations
pub type Result<T> = std::result::Result<T, ParametersError>;
