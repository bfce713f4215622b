/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! # simex-rs
//!
//! Start-to-end (s2e) simulation of X-ray free-electron laser experiments.
//!
//! The crate does not simulate physics itself. It validates the parameters of
//! each simulation stage, prepares the input files of the external programs
//! that do (XMDYN, pattern_sim), runs them, and turns their native output into
//! the common s2e layout so the next stage can read it.
//!
//! ```no_run
//! use simex_rs::calculators::{Calculator, XmdynPhotonMatterInteractor};
//! use simex_rs::pipeline::ExperimentPipeline;
//! use serde_json::json;
//!
//! let pmi = XmdynPhotonMatterInteractor::new(
//!     json!({"number_of_trajectories": 2}),
//!     Some("prop".into()),
//!     Some("pmi".into()),
//!     "sample.pdb",
//! )?;
//! let mut pipeline = ExperimentPipeline::new().with_stage(pmi);
//! pipeline.run()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod calculators;
pub mod cli;
pub mod config;
pub mod converters;
pub mod parameters;
pub mod pipeline;
pub mod s2e;
pub mod sample;
pub mod utils;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
