/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for pipelines

use crate::calculators::CalculatorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Pipeline has no stages")]
    Empty,

    #[error("Stage {index} ({name}) exited with status {status}")]
    StageFailed {
        index: usize,
        name: &'static str,
        status: i32,
    },

    #[error("Stage {index} ({name}) failed: {source}")]
    Calculator {
        index: usize,
        name: &'static str,
        #[source]
        source: CalculatorError,
    },
}

/// A specialized Result type for pipelines
pub type Result<T> = std::result::Result<T, PipelineError>;
