/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the utils module

use thiserror::Error;

/// Errors that can occur when building physical quantities
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UtilsError {
    /// A quantity was not a finite number
    #[error("{quantity} must be finite, got {value}")]
    NotFinite { quantity: &'static str, value: f64 },

    /// A quantity was outside of its allowed range
    #[error("{quantity} out of range: {message}")]
    OutOfRange {
        quantity: &'static str,
        message: String,
    },
}

/// A specialized Result type for utils operations
pub type Result<T> = std::result::Result<T, UtilsError>;
