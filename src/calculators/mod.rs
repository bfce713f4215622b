/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Calculators: pipeline stages wrapping an external backengine
//!
//! A calculator takes validated parameters and an input path, prepares the
//! files its backengine expects, runs it, and normalizes the native results
//! into the s2e layout.

pub mod backengine;
pub mod dump;
pub mod errors;
pub mod pattern_sim;
pub mod snapshot;
pub mod xmdyn;

pub use backengine::{Backengine, BackengineOutput};
pub use dump::{dump_to_file, load_dump, run_from_file, CalculatorDump};
pub use errors::{CalculatorError, Result};
pub use pattern_sim::PatternSimPhotonDiffractor;
pub use snapshot::{load_snapshot_from_dir, snapshot_dirs, XmdynSnapshot, SNAPSHOT_FILES};
pub use xmdyn::{convert_xmdyn_run, PmiInput, XmdynPhotonMatterInteractor};

use std::path::{Path, PathBuf};

/// One stage of a start-to-end simulation
pub trait Calculator {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn input_path(&self) -> Option<&Path>;

    /// Point the calculator at new input, typically the previous stage's output
    fn set_input_path(&mut self, path: PathBuf);

    fn output_path(&self) -> &Path;

    /// Run the external program.
    ///
    /// Returns the backengine's exit status: `0` on success, the first
    /// non-zero status otherwise.
    fn backengine(&mut self) -> Result<i32>;

    /// Write the results in the s2e layout
    fn save_h5(&mut self) -> Result<()>;

    /// Serializable snapshot of the calculator's state
    fn to_dump(&self) -> CalculatorDump;
}
