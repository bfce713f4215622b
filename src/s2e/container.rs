/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Reading and writing data trees to disk
//!
//! Files are identified by content, not by extension: backengines write
//! `.h5` names regardless of the container actually used.

use super::errors::{Result, S2eError};
use super::tree::Group;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

const HDF5_MAGIC: [u8; 8] = [0x89, b'H', b'D', b'F', b'\r', b'\n', 0x1a, b'\n'];

/// On-disk container holding a data tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerFormat {
    Hdf5,
    Json,
}

impl ContainerFormat {
    /// HDF5 when compiled in, JSON otherwise
    pub fn preferred() -> Self {
        if cfg!(feature = "hdf5") {
            ContainerFormat::Hdf5
        } else {
            ContainerFormat::Json
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContainerFormat::Hdf5 => "hdf5",
            ContainerFormat::Json => "json",
        }
    }
}

impl Default for ContainerFormat {
    fn default() -> Self {
        Self::preferred()
    }
}

impl FromStr for ContainerFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hdf5" | "h5" => Ok(ContainerFormat::Hdf5),
            "json" => Ok(ContainerFormat::Json),
            other => Err(format!("unknown storage format '{}'", other)),
        }
    }
}

/// Detect the container format of the file at `path`
pub fn detect_format(path: &Path) -> Result<ContainerFormat> {
    let mut file = File::open(path).map_err(|e| S2eError::io(path, e))?;
    let mut head = [0u8; 64];
    let mut filled = 0;
    while filled < head.len() {
        let read = file
            .read(&mut head[filled..])
            .map_err(|e| S2eError::io(path, e))?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    let head = &head[..filled];

    if head.starts_with(&HDF5_MAGIC) {
        return Ok(ContainerFormat::Hdf5);
    }
    match head.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => Ok(ContainerFormat::Json),
        _ => Err(S2eError::UnknownFormat(path.to_path_buf())),
    }
}

/// Read the tree stored at `path`
pub fn read_tree(path: &Path) -> Result<Group> {
    let format = detect_format(path)?;
    debug!("Reading {} container {}", format.as_str(), path.display());
    match format {
        ContainerFormat::Json => read_json(path),
        ContainerFormat::Hdf5 => read_hdf5(path),
    }
}

/// Write `root` to `path` in the given container format
pub fn write_tree(path: &Path, root: &Group, format: ContainerFormat) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| S2eError::io(parent, e))?;
    }
    debug!("Writing {} container {}", format.as_str(), path.display());
    match format {
        ContainerFormat::Json => write_json(path, root),
        ContainerFormat::Hdf5 => write_hdf5(path, root),
    }
}

fn read_json(path: &Path) -> Result<Group> {
    let file = File::open(path).map_err(|e| S2eError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| S2eError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json(path: &Path, root: &Group) -> Result<()> {
    let file = File::create(path).map_err(|e| S2eError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, root).map_err(|source| S2eError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|e| S2eError::io(path, e))
}

#[cfg(feature = "hdf5")]
fn read_hdf5(path: &Path) -> Result<Group> {
    super::hdf5_store::read(path)
}

#[cfg(not(feature = "hdf5"))]
fn read_hdf5(path: &Path) -> Result<Group> {
    Err(S2eError::Hdf5Unavailable(path.to_path_buf()))
}

#[cfg(feature = "hdf5")]
fn write_hdf5(path: &Path, root: &Group) -> Result<()> {
    super::hdf5_store::write(path, root)
}

#[cfg(not(feature = "hdf5"))]
fn write_hdf5(path: &Path, _root: &Group) -> Result<()> {
    Err(S2eError::Hdf5Unavailable(path.to_path_buf()))
}
