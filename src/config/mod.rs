/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Platform configuration
//!
//! Where the backengine executables live, which container format results are
//! stored in and how MPI jobs are launched. Values are layered: built-in
//! defaults, then an optional JSON file, then `SIMEX_*` environment variables.

pub mod errors;

pub use errors::{ConfigError, Result};

use crate::s2e::ContainerFormat;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_XMDYN: &str = "SIMEX_XMDYN";
pub const ENV_PATTERN_SIM: &str = "SIMEX_PATTERN_SIM";
pub const ENV_STORAGE: &str = "SIMEX_STORAGE";
pub const ENV_MPI_LAUNCHER: &str = "SIMEX_MPI_LAUNCHER";

/// Backengine executables, resolved through `PATH` when not absolute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutablePaths {
    pub xmdyn: PathBuf,
    pub pattern_sim: PathBuf,
}

impl Default for ExecutablePaths {
    fn default() -> Self {
        Self {
            xmdyn: PathBuf::from("xmdyn"),
            pattern_sim: PathBuf::from("pattern_sim"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub executables: ExecutablePaths,
    pub storage: ContainerFormat,
    pub mpi_launcher: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            executables: ExecutablePaths::default(),
            storage: ContainerFormat::preferred(),
            mpi_launcher: "mpirun".to_string(),
        }
    }
}

impl PlatformConfig {
    /// Defaults, overlaid with `file` when given, overlaid with the environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Read a JSON file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply `SIMEX_*` overrides looked up through `lookup`; empty values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(xmdyn) = get(ENV_XMDYN) {
            self.executables.xmdyn = PathBuf::from(xmdyn);
        }
        if let Some(pattern_sim) = get(ENV_PATTERN_SIM) {
            self.executables.pattern_sim = PathBuf::from(pattern_sim);
        }
        if let Some(storage) = get(ENV_STORAGE) {
            self.storage = storage
                .parse()
                .map_err(|message| ConfigError::Environment {
                    name: ENV_STORAGE.to_string(),
                    message,
                })?;
        }
        if let Some(launcher) = get(ENV_MPI_LAUNCHER) {
            self.mpi_launcher = launcher;
        }
        Ok(())
    }
}
