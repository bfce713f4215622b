/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for calculators

use crate::parameters::ParametersError;
use crate::s2e::S2eError;
use crate::sample::SampleError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing, running or post-processing a backengine
#[derive(Debug, Error)]
pub enum CalculatorError {
    #[error("Backengine executable not found: {0}")]
    ExecutableNotFound(String),

    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input not found: {0}")]
    MissingInput(PathBuf),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cannot parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("No backengine output to save in {0}")]
    NoOutput(PathBuf),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Parameters(#[from] ParametersError),

    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error(transparent)]
    S2e(#[from] S2eError),
}

impl CalculatorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CalculatorError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for calculator operations
pub type Result<T> = std::result::Result<T, CalculatorError>;
