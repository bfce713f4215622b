/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the s2e data layer

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, reading or writing s2e data trees
#[derive(Error, Debug)]
pub enum S2eError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON container error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    #[error("HDF5 support is not compiled in, cannot access {0} (enable the `hdf5` feature)")]
    Hdf5Unavailable(PathBuf),

    #[error("Unrecognized container format: {0}")]
    UnknownFormat(PathBuf),

    #[error("Missing member: {0}")]
    MissingMember(String),

    #[error("Member {path} is not a {expected}")]
    WrongKind { path: String, expected: &'static str },

    #[error("Dataset {path} has unexpected shape {found:?}, expected {expected}")]
    WrongShape {
        path: String,
        found: Vec<usize>,
        expected: String,
    },

    #[error("Invalid member path: {0:?}")]
    InvalidPath(String),

    #[error("Layout violation: {0}")]
    Layout(String),
}

impl S2eError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        S2eError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for s2e operations
pub type Result<T> = std::result::Result<T, S2eError>;
