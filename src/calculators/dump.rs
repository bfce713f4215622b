/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Calculator dumps
//!
//! A dump is the JSON form of a configured calculator. Batch and MPI jobs load
//! a dump and run it with [`run_from_file`].

use super::errors::{CalculatorError, Result};
use super::pattern_sim::PatternSimPhotonDiffractor;
use super::xmdyn::XmdynPhotonMatterInteractor;
use super::Calculator;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "calculator", rename_all = "snake_case")]
pub enum CalculatorDump {
    Xmdyn(XmdynPhotonMatterInteractor),
    PatternSim(PatternSimPhotonDiffractor),
}

impl CalculatorDump {
    pub fn into_calculator(self) -> Box<dyn Calculator> {
        match self {
            CalculatorDump::Xmdyn(calculator) => Box::new(calculator),
            CalculatorDump::PatternSim(calculator) => Box::new(calculator),
        }
    }
}

/// Write `calculator` as JSON to `path`
pub fn dump_to_file(calculator: &dyn Calculator, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(&calculator.to_dump())?;
    fs::write(path, text).map_err(|e| CalculatorError::io(path, e))?;
    info!("Dumped {} calculator to {}", calculator.name(), path.display());
    Ok(())
}

pub fn load_dump(path: &Path) -> Result<Box<dyn Calculator>> {
    let text = fs::read_to_string(path).map_err(|e| CalculatorError::io(path, e))?;
    let dump: CalculatorDump = serde_json::from_str(&text)?;
    Ok(dump.into_calculator())
}

/// Load a dump and run it: backengine, then `save_h5` on success.
///
/// Returns the backengine status.
pub fn run_from_file(path: &Path) -> Result<i32> {
    let mut calculator = load_dump(path)?;
    info!("Running {} from {}", calculator.name(), path.display());
    let status = calculator.backengine()?;
    if status != 0 {
        warn!("{} exited with status {}", calculator.name(), status);
        return Ok(status);
    }
    calculator.save_h5()?;
    Ok(0)
}
