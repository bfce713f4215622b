/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for data converters

use crate::s2e::S2eError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConverterError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No time steps found under data/")]
    NoTimeSteps,

    #[error("Missing attribute {attribute} on {path}")]
    MissingAttribute { path: String, attribute: &'static str },

    #[error("Particle records have inconsistent lengths: {0}")]
    Inconsistent(String),

    #[error(transparent)]
    S2e(#[from] S2eError),
}

/// A specialized Result type for converters
pub type Result<T> = std::result::Result<T, ConverterError>;
