/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! openPMD particle-in-cell output to a genesis particle distribution
//!
//! Reads the electron species `e` of the last iteration of an openPMD tree and
//! writes the six-column `beam.dist` text file genesis reads with
//! `distfile`.

use super::errors::{ConverterError, Result};
use crate::s2e::{read_tree, AttrValue, Group, Node, S2eError};
use crate::utils::constants::{ELECTRON_MASS, SPEED_OF_LIGHT};
use crate::utils::format_exponent;
use log::{debug, info};
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub const COLUMNS: [&str; 6] = ["X", "XPRIME", "Y", "YPRIME", "T", "P"];
const SPECIES: &str = "particles/e";

/// Macro-particle table in genesis column order and the bunch charge in C
#[derive(Debug, Clone, PartialEq)]
pub struct GenesisDistribution {
    pub particles: Array2<f64>,
    pub charge: f64,
}

fn attrs_of(node: &Node) -> Option<&BTreeMap<String, AttrValue>> {
    match node {
        Node::Group(group) => Some(&group.attrs),
        Node::Dataset(dataset) => Some(&dataset.attrs),
        Node::ExternalLink(_) => None,
    }
}

fn attribute(root: &Group, path: &str, name: &'static str) -> Result<Option<f64>> {
    let node = root
        .get(path)
        .ok_or_else(|| S2eError::MissingMember(path.to_string()))?;
    Ok(attrs_of(node)
        .and_then(|attrs| attrs.get(name))
        .and_then(AttrValue::as_f64))
}

/// Record component scaled to SI; `unitSI` defaults to 1
fn component(root: &Group, path: &str) -> Result<Array1<f64>> {
    let values = root.float_array(path)?;
    let unit = attribute(root, path, "unitSI")?.unwrap_or(1.0);
    Ok(values.iter().map(|v| v * unit).collect())
}

/// Name of the highest numbered iteration under `data/`
fn last_iteration(root: &Group) -> Result<String> {
    root.group("data")?
        .members()
        .filter(|(_, node)| matches!(node, Node::Group(_)))
        .filter_map(|(name, _)| name.parse::<u64>().ok().map(|step| (step, name)))
        .max_by_key(|(step, _)| *step)
        .map(|(_, name)| name.to_string())
        .ok_or(ConverterError::NoTimeSteps)
}

impl GenesisDistribution {
    /// Build the distribution from an openPMD tree.
    ///
    /// Genesis propagates along z while the PIC code uses y, hence
    /// `X = x`, `XPRIME = atan(px/py)`, `Y = z`, `YPRIME = atan(pz/py)`,
    /// `T = y/c` and `P = |p| / (m_e c)`.
    pub fn from_openpmd(root: &Group) -> Result<Self> {
        let iteration = last_iteration(root)?;
        let species = format!("data/{}/{}", iteration, SPECIES);
        debug!("Reading {} of iteration {}", SPECIES, iteration);

        let read = |record: &str, axis: &str| component(root, &format!("{}/{}/{}", species, record, axis));
        let (x, y, z) = (read("position", "x")?, read("position", "y")?, read("position", "z")?);
        let (px, py, pz) = (read("momentum", "x")?, read("momentum", "y")?, read("momentum", "z")?);

        let n = x.len();
        for (name, len) in [
            ("position/y", y.len()),
            ("position/z", z.len()),
            ("momentum/x", px.len()),
            ("momentum/y", py.len()),
            ("momentum/z", pz.len()),
        ] {
            if len != n {
                return Err(ConverterError::Inconsistent(format!(
                    "{} has {} entries, position/x has {}",
                    name, len, n
                )));
            }
        }

        let reference = ELECTRON_MASS * SPEED_OF_LIGHT;
        let particles = Array2::from_shape_fn((n, COLUMNS.len()), |(i, column)| match column {
            0 => x[i],
            1 => (px[i] / py[i]).atan(),
            2 => z[i],
            3 => (pz[i] / py[i]).atan(),
            4 => y[i] / SPEED_OF_LIGHT,
            _ => (px[i] * px[i] + py[i] * py[i] + pz[i] * pz[i]).sqrt() / reference,
        });

        let charge_path = format!("{}/charge", species);
        let charge_value = attribute(root, &charge_path, "value")?.ok_or_else(|| {
            ConverterError::MissingAttribute {
                path: charge_path.clone(),
                attribute: "value",
            }
        })?;
        let charge_unit = attribute(root, &charge_path, "unitSI")?.unwrap_or(1.0);
        let counts = root.float_array(&format!("{}/particlePatches/numParticles", species))?;
        let charge = counts.sum() * charge_value * charge_unit;

        Ok(Self { particles, charge })
    }

    pub fn len(&self) -> usize {
        self.particles.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.nrows() == 0
    }

    pub fn to_text(&self) -> String {
        let mut text = String::new();
        // writing to a String cannot fail
        let _ = writeln!(text, "? VERSION = 1.0");
        let _ = writeln!(text, "? SIZE = {}", self.len());
        let _ = writeln!(text, "? CHARGE = {}", format_exponent(self.charge, 6, true));
        let _ = writeln!(text, "? COLUMNS {}", COLUMNS.join(" "));
        for row in self.particles.rows() {
            let line: Vec<String> = row.iter().map(|&v| format_exponent(v, 18, false)).collect();
            let _ = writeln!(text, "{}", line.join(" "));
        }
        text
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_text()).map_err(|source| ConverterError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Convert the openPMD file `input` into the genesis distribution file `output`
pub fn convert_pic_to_genesis(input: &Path, output: &Path) -> Result<GenesisDistribution> {
    let root = read_tree(input)?;
    let distribution = GenesisDistribution::from_openpmd(&root)?;
    distribution.write(output)?;
    info!(
        "Wrote {} particles ({} C) to {}",
        distribution.len(),
        format_exponent(distribution.charge, 3, true),
        output.display()
    );
    Ok(distribution)
}
