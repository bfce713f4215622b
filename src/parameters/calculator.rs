/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Parameters shared by every calculator

use super::dictionary::ParameterDictionary;
use super::errors::{ParametersError, Result};
use serde::{Deserialize, Serialize};

/// Resources and launch settings common to all calculators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorParameters {
    /// Threads per task, exported as `OMP_NUM_THREADS`
    pub cpus_per_task: usize,
    /// Launcher command line replacing the default MPI prefix, e.g. `srun -n 4`
    pub forced_mpi_command: String,
}

impl Default for CalculatorParameters {
    fn default() -> Self {
        Self {
            cpus_per_task: 1,
            forced_mpi_command: String::new(),
        }
    }
}

impl CalculatorParameters {
    pub fn validate(&self) -> Result<()> {
        if self.cpus_per_task < 1 {
            return Err(ParametersError::invalid("cpus_per_task", "must be at least 1"));
        }
        Ok(())
    }

    /// Consume `cpus_per_task` and `forced_mpi_command` from a parameter map
    pub fn from_dictionary(dict: &mut ParameterDictionary) -> Result<Self> {
        let mut common = Self::default();
        if let Some(cpus) = dict.usize("cpus_per_task")? {
            common.cpus_per_task = cpus;
        }
        if let Some(command) = dict.string("forced_mpi_command")? {
            common.forced_mpi_command = command;
        }
        common.validate()?;
        Ok(common)
    }

    /// Words prepended to the backengine command line.
    ///
    /// A forced command always wins; otherwise `launcher -np <ntasks>` is used
    /// for more than one task and nothing for a single task.
    pub fn mpi_prefix(&self, launcher: &str, ntasks: usize) -> Vec<String> {
        let forced: Vec<String> = self
            .forced_mpi_command
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if !forced.is_empty() {
            return forced;
        }
        if ntasks > 1 && !launcher.trim().is_empty() {
            return vec![launcher.trim().to_string(), "-np".to_string(), ntasks.to_string()];
        }
        Vec::new()
    }

    pub fn thread_env(&self) -> (String, String) {
        ("OMP_NUM_THREADS".to_string(), self.cpus_per_task.to_string())
    }
}

/// A validated, serializable parameter object
pub trait ParameterSet: Serialize {
    /// Check every invariant of the parameter object
    fn validate(&self) -> Result<()>;

    fn common(&self) -> &CalculatorParameters;

    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parameters given either as a typed object or as a key/value map
pub trait IntoParameters<P> {
    fn into_parameters(self) -> Result<P>;
}
