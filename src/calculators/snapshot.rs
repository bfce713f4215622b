/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! XMDYN snapshots
//!
//! XMDYN writes one directory per stored time step, `snp/<step:08>/`, holding
//! whitespace separated text tables:
//!
//! | file    | content                                   |
//! |---------|-------------------------------------------|
//! | `Z.dat` | atomic number per atom                    |
//! | `T.dat` | atom type per atom (row of `f0.dat`)      |
//! | `uid.dat` | unique atom id                          |
//! | `r.dat` | positions, N x 3, m                       |
//! | `v.dat` | velocities, N x 3, m/s                    |
//! | `m.dat` | masses per atom                           |
//! | `q.dat` | charge per atom, units of e               |
//! | `f0.dat`| form factor per type (rows) and Q (cols)  |
//! | `Q.dat` | momentum transfer grid                    |

use super::errors::{CalculatorError, Result};
use crate::s2e::{Dataset, Group};
use log::debug;
use ndarray::{arr1, Array1, Array2, Axis};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Snapshot tables, in load order
pub const SNAPSHOT_FILES: [&str; 9] = ["Z", "T", "uid", "r", "v", "m", "q", "f0", "Q"];

/// One time step of an XMDYN trajectory
#[derive(Debug, Clone, PartialEq)]
pub struct XmdynSnapshot {
    pub atomic_numbers: Array1<i64>,
    pub types: Array1<i64>,
    pub uid: Array1<i64>,
    pub positions: Array2<f64>,
    pub velocities: Array2<f64>,
    pub masses: Array1<f64>,
    pub charges: Array1<f64>,
    pub form_factors: Array2<f64>,
    pub q: Array1<f64>,
}

/// Rows of numbers in a snapshot table
fn read_table(path: &Path) -> Result<Vec<Vec<f64>>> {
    let text = fs::read_to_string(path).map_err(|e| CalculatorError::io(path, e))?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            line.split_whitespace()
                .map(|token| {
                    token.parse::<f64>().map_err(|_| CalculatorError::Parse {
                        path: path.to_path_buf(),
                        message: format!("line {}: '{}' is not a number", index + 1, token),
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect()
}

fn read_vector(path: &Path) -> Result<Array1<f64>> {
    Ok(read_table(path)?.into_iter().flatten().collect())
}

fn read_integers(path: &Path) -> Result<Array1<i64>> {
    read_vector(path)?
        .iter()
        .map(|&value| {
            if value.fract() != 0.0 {
                return Err(CalculatorError::Parse {
                    path: path.to_path_buf(),
                    message: format!("expected integers, found {}", value),
                });
            }
            Ok(value as i64)
        })
        .collect()
}

fn read_matrix(path: &Path, columns: Option<usize>) -> Result<Array2<f64>> {
    let rows = read_table(path)?;
    let values: Vec<f64> = rows.iter().flatten().copied().collect();
    let columns = match columns {
        Some(columns) => columns,
        None => rows.first().map(Vec::len).unwrap_or(0),
    };
    if columns == 0 || values.len() % columns != 0 {
        return Err(CalculatorError::Parse {
            path: path.to_path_buf(),
            message: format!("{} values do not form rows of {}", values.len(), columns),
        });
    }
    Array2::from_shape_vec((values.len() / columns, columns), values).map_err(|e| {
        CalculatorError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })
}

/// Load the snapshot stored in `dir`
pub fn load_snapshot_from_dir(dir: &Path) -> Result<XmdynSnapshot> {
    if !dir.is_dir() {
        return Err(CalculatorError::MissingInput(dir.to_path_buf()));
    }
    let file = |name: &str| dir.join(format!("{}.dat", name));

    let snapshot = XmdynSnapshot {
        atomic_numbers: read_integers(&file("Z"))?,
        types: read_integers(&file("T"))?,
        uid: read_integers(&file("uid"))?,
        positions: read_matrix(&file("r"), Some(3))?,
        velocities: read_matrix(&file("v"), Some(3))?,
        masses: read_vector(&file("m"))?,
        charges: read_vector(&file("q"))?,
        form_factors: read_matrix(&file("f0"), None)?,
        q: read_vector(&file("Q"))?,
    };
    snapshot.validate(dir)?;
    debug!(
        "Loaded snapshot {} with {} atoms",
        dir.display(),
        snapshot.number_of_atoms()
    );
    Ok(snapshot)
}

/// Snapshot directories under `run_dir/snp`, in ascending step order
pub fn snapshot_dirs(run_dir: &Path) -> Result<Vec<PathBuf>> {
    let snp = run_dir.join("snp");
    let entries = fs::read_dir(&snp).map_err(|e| CalculatorError::io(&snp, e))?;

    let mut steps = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CalculatorError::io(&snp, e))?;
        let path = entry.path();
        let step = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.parse::<u64>().ok());
        match step {
            Some(step) if path.is_dir() => steps.push((step, path)),
            _ => debug!("Ignoring {} in snapshot directory", path.display()),
        }
    }
    steps.sort_by_key(|(step, _)| *step);
    Ok(steps.into_iter().map(|(_, path)| path).collect())
}

impl XmdynSnapshot {
    pub fn number_of_atoms(&self) -> usize {
        self.atomic_numbers.len()
    }

    fn validate(&self, dir: &Path) -> Result<()> {
        let n = self.number_of_atoms();
        let invalid = |message: String| CalculatorError::Parse {
            path: dir.to_path_buf(),
            message,
        };
        for (name, len) in [
            ("T", self.types.len()),
            ("uid", self.uid.len()),
            ("r", self.positions.nrows()),
            ("v", self.velocities.nrows()),
            ("m", self.masses.len()),
            ("q", self.charges.len()),
        ] {
            if len != n {
                return Err(invalid(format!("{} has {} rows, expected {}", name, len, n)));
            }
        }
        if self.form_factors.ncols() != self.q.len() {
            return Err(invalid(format!(
                "f0 has {} columns but Q has {} points",
                self.form_factors.ncols(),
                self.q.len()
            )));
        }
        let types = self.form_factors.nrows() as i64;
        if let Some(bad) = self.types.iter().find(|&&t| t < 0 || t >= types) {
            return Err(invalid(format!("atom type {} has no form factor row", bad)));
        }
        Ok(())
    }

    /// Snapshot group of the s2e PMI layout.
    ///
    /// `T`, `Z` and `ff` hold one entry per atom type present; `xyz` maps each
    /// atom to its type row. The Compton scattering terms follow the
    /// Waller-Hartree approximation with effective charge `Z - q` and are
    /// zero unless `compton` is set. `nph` is the number of photons in the pulse.
    pub fn to_s2e(&self, nph: f64, compton: bool) -> Result<Group> {
        let present: Vec<i64> = self
            .types
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let type_z: Vec<i64> = present
            .iter()
            .map(|&t| {
                self.types
                    .iter()
                    .position(|&atom_type| atom_type == t)
                    .map(|atom| self.atomic_numbers[atom])
                    .unwrap_or_default()
            })
            .collect();
        let rows: Vec<usize> = present.iter().map(|&t| t as usize).collect();
        let ff = self.form_factors.select(Axis(0), &rows);
        let xyz: Array1<i64> = self
            .types
            .iter()
            .map(|t| present.binary_search(t).map(|i| i as i64).unwrap_or(-1))
            .collect();

        let half_q = &self.q / 2.0;
        let mut sq_bound = Array1::<f64>::zeros(self.q.len());
        let mut sq_free = Array1::<f64>::zeros(self.q.len());
        if compton {
            for ((&z, &charge), &t) in self
                .atomic_numbers
                .iter()
                .zip(self.charges.iter())
                .zip(self.types.iter())
            {
                let z_eff = z as f64 - charge;
                if z_eff > 0.0 {
                    let row = self.form_factors.row(t as usize);
                    sq_bound
                        .iter_mut()
                        .zip(row.iter())
                        .for_each(|(s, f)| *s += z_eff - f * f / z_eff);
                }
            }
            sq_free.fill(self.charges.sum());
        }

        let mut group = Group::new();
        group.insert_int("T", arr1(&present).into_dyn())?;
        group.insert_int("Z", arr1(&type_z).into_dyn())?;
        group.insert_float("ff", ff.into_dyn())?;
        group.insert_float("halfQ", half_q.clone().into_dyn())?;
        group.insert_float("r", self.positions.clone().into_dyn())?;
        group.insert_int("xyz", xyz.into_dyn())?;
        group.insert_float("Sq_halfQ", half_q.into_dyn())?;
        group.insert_float("Sq_bound", sq_bound.into_dyn())?;
        group.insert_float("Sq_free", sq_free.into_dyn())?;
        group.insert("Nph", Dataset::float(arr1(&[nph]).into_dyn()))?;
        Ok(group)
    }
}
