/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Simulate-to-experiment (s2e) data layer
//!
//! This module holds the in-memory tree every calculator writes its results
//! into, the common s2e layout (`data`, `history`, `info`, `misc`, `params`,
//! `version`) and the container readers/writers. HDF5 storage is available
//! with the `hdf5` cargo feature; a JSON container with the same tree model is
//! always available.

pub mod container;
pub mod errors;
#[cfg(feature = "hdf5")]
mod hdf5_store;
pub mod layout;
pub mod tree;

pub use container::{detect_format, read_tree, write_tree, ContainerFormat};
pub use errors::{Result, S2eError};
pub use layout::{
    link_parent, new_document, numbered_file_name, pattern_group_name, snapshot_group_name,
    validate_layout, S2eInfo, S2E_FORMAT_VERSION, S2E_GROUPS,
};
pub use tree::{AttrValue, Dataset, DatasetValue, ExternalLink, Group, Node};
