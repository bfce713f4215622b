/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! The simulate-to-experiment (s2e) file layout
//!
//! Every stage writes the same six top-level members so that the next stage
//! can consume any upstream calculator's output interchangeably.

use super::errors::{Result, S2eError};
use super::tree::{Group, Node};
use std::path::Path;

/// Required top-level members of an s2e file
pub const S2E_GROUPS: [&str; 6] = ["data", "history", "info", "misc", "params", "version"];

/// Layout version written to `/version`
pub const S2E_FORMAT_VERSION: f64 = 0.2;

/// Descriptive metadata written to `/info`
#[derive(Debug, Clone, PartialEq)]
pub struct S2eInfo {
    pub package_version: String,
    pub method_description: String,
    pub contact: String,
    pub data_description: String,
}

impl S2eInfo {
    pub fn new(method_description: impl Into<String>, data_description: impl Into<String>) -> Self {
        Self {
            package_version: format!("simex-rs {}", crate::VERSION),
            method_description: method_description.into(),
            contact: crate::AUTHORS.to_string(),
            data_description: data_description.into(),
        }
    }
}

/// Build an empty s2e document carrying `info`
pub fn new_document(info: &S2eInfo) -> Result<Group> {
    let mut root = Group::new();
    for name in ["data", "history", "misc", "params"] {
        root.ensure_group(name)?;
    }
    root.insert_text("info/package_version", &info.package_version)?;
    root.insert_text("info/method_description", &info.method_description)?;
    root.insert_text("info/contact", &info.contact)?;
    root.insert_text("info/data_description", &info.data_description)?;
    root.insert_scalar("version", S2E_FORMAT_VERSION)?;
    Ok(root)
}

/// Link `parent` into `history/parent` of `root`
pub fn link_parent(root: &mut Group, parent: &Path) -> Result<()> {
    root.insert_link("history/parent", parent, "/")
}

/// Check that `root` carries every required top-level member
pub fn validate_layout(root: &Group) -> Result<()> {
    for name in S2E_GROUPS {
        match root.get(name) {
            None => return Err(S2eError::Layout(format!("missing top-level member '{}'", name))),
            Some(Node::Dataset(_)) if name != "version" => {
                return Err(S2eError::Layout(format!("'{}' must be a group", name)))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Numbered file name, e.g. `pmi_out_0000001.h5`
pub fn numbered_file_name(prefix: &str, index: usize) -> String {
    format!("{}_{:07}.h5", prefix, index)
}

/// Numbered snapshot group name, e.g. `snp_0000001`
pub fn snapshot_group_name(index: usize) -> String {
    format!("snp_{:07}", index)
}

/// Numbered pattern group name, e.g. `0000001`
pub fn pattern_group_name(index: usize) -> String {
    format!("{:07}", index)
}
