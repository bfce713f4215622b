/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the sample module

use crate::s2e::S2eError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or transforming samples
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Sample file not found: {0}")]
    NotFound(PathBuf),

    #[error("PDB parse error at line {line}: {message}")]
    PdbParse { line: usize, message: String },

    #[error("Unknown element: {0}")]
    UnknownElement(String),

    #[error("Invalid atomic number: {0}")]
    InvalidAtomicNumber(i64),

    #[error("Sample contains no atoms: {0}")]
    Empty(PathBuf),

    #[error("Invalid sample data: {0}")]
    InvalidData(String),

    #[error("Invalid rotation: {0}")]
    InvalidRotation(String),

    #[error(transparent)]
    S2e(#[from] S2eError),
}

/// Result type for sample operations
pub type Result<T> = std::result::Result<T, SampleError>;
