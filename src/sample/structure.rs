/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Sample structures handed to photon-matter interaction codes

use super::database::{element_symbol, MAX_ATOMIC_NUMBER};
use super::errors::{Result, SampleError};
use super::pdb::parse_pdb;
use super::rotation::Quaternion;
use crate::s2e::{read_tree, Group};
use crate::utils::meter_to_angstrom;
use log::debug;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// A single atom; `position` is in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleAtom {
    pub atomic_number: u32,
    pub position: [f64; 3],
}

/// An atomistic sample
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    atoms: Vec<SampleAtom>,
}

impl Sample {
    pub fn new(atoms: Vec<SampleAtom>) -> Self {
        Self { atoms }
    }

    /// Load a sample from a `.pdb` file or an s2e sample file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SampleError::NotFound(path.to_path_buf()));
        }

        let is_pdb = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdb"))
            .unwrap_or(false);

        let sample = if is_pdb {
            let text = fs::read_to_string(path).map_err(|source| SampleError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_pdb_str(&text)?
        } else {
            Self::from_s2e(&read_tree(path)?)?
        };

        if sample.is_empty() {
            return Err(SampleError::Empty(path.to_path_buf()));
        }
        debug!("Loaded {} atoms from {}", sample.len(), path.display());
        Ok(sample)
    }

    pub fn from_pdb_str(text: &str) -> Result<Self> {
        Ok(Self::new(parse_pdb(text)?))
    }

    /// Sample from `Z` and `r` datasets, at the root or under `data/`
    pub fn from_s2e(root: &Group) -> Result<Self> {
        let base = if root.contains("Z") { "" } else { "data/" };
        let numbers = root.float_array(&format!("{}Z", base))?;
        let positions = root.float_array(&format!("{}r", base))?;

        let positions = positions
            .into_dimensionality::<ndarray::Ix2>()
            .map_err(|_| SampleError::InvalidData("r must be a two-dimensional array".to_string()))?;
        if positions.ncols() != 3 || positions.nrows() != numbers.len() {
            return Err(SampleError::InvalidData(format!(
                "r has shape {:?} but Z has {} entries",
                positions.shape(),
                numbers.len()
            )));
        }

        let atoms = numbers
            .iter()
            .zip(positions.axis_iter(Axis(0)))
            .map(|(&z, row)| {
                let atomic_number = z.round() as i64;
                if atomic_number < 1 || atomic_number > MAX_ATOMIC_NUMBER as i64 {
                    return Err(SampleError::InvalidAtomicNumber(atomic_number));
                }
                Ok(SampleAtom {
                    atomic_number: atomic_number as u32,
                    position: [row[0], row[1], row[2]],
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(atoms))
    }

    pub fn atoms(&self) -> &[SampleAtom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atomic_numbers(&self) -> Array1<i64> {
        self.atoms.iter().map(|a| a.atomic_number as i64).collect()
    }

    /// Positions as an N x 3 array in meters
    pub fn positions(&self) -> Array2<f64> {
        let mut positions = Array2::zeros((self.atoms.len(), 3));
        for (mut row, atom) in positions.axis_iter_mut(Axis(0)).zip(&self.atoms) {
            row[0] = atom.position[0];
            row[1] = atom.position[1];
            row[2] = atom.position[2];
        }
        positions
    }

    /// Copy of the sample rotated about the origin
    pub fn rotated(&self, rotation: &Quaternion) -> Self {
        if rotation.is_identity() {
            return self.clone();
        }
        let atoms = self
            .atoms
            .iter()
            .map(|atom| SampleAtom {
                atomic_number: atom.atomic_number,
                position: rotation.rotate(atom.position),
            })
            .collect();
        Self::new(atoms)
    }

    /// XYZ text: atom count, comment line, then `symbol x y z` in angstrom
    pub fn to_xyz_string(&self) -> Result<String> {
        let mut text = String::new();
        // writing to a String cannot fail
        let _ = writeln!(text, "{}", self.atoms.len());
        let _ = writeln!(text, "sample");
        for atom in &self.atoms {
            let symbol = element_symbol(atom.atomic_number)
                .ok_or(SampleError::InvalidAtomicNumber(atom.atomic_number as i64))?;
            let [x, y, z] = atom.position.map(meter_to_angstrom);
            let _ = writeln!(text, "{} {:.6} {:.6} {:.6}", symbol, x, y, z);
        }
        Ok(text)
    }

    pub fn write_xyz(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_xyz_string()?).map_err(|source| SampleError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr2;
    use tempfile::tempdir;

    fn water() -> Sample {
        Sample::new(vec![
            SampleAtom {
                atomic_number: 8,
                position: [0.0, 0.0, 0.0],
            },
            SampleAtom {
                atomic_number: 1,
                position: [0.9572e-10, 0.0, 0.0],
            },
            SampleAtom {
                atomic_number: 1,
                position: [-0.24e-10, 0.927e-10, 0.0],
            },
        ])
    }

    #[test]
    fn test_xyz_output_in_angstrom() {
        let text = water().to_xyz_string().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "3");
        assert_eq!(lines[2], "O 0.000000 0.000000 0.000000");
        assert_eq!(lines[3], "H 0.957200 0.000000 0.000000");
    }

    #[test]
    fn test_rotation_preserves_distances() {
        let sample = water();
        let q = Quaternion::from_array([0.5, 0.5, 0.5, 0.5]).unwrap();
        let rotated = sample.rotated(&q);

        let d = |s: &Sample| {
            let a = s.atoms()[1].position;
            a.iter().map(|v| v * v).sum::<f64>().sqrt()
        };
        assert_relative_eq!(d(&sample), d(&rotated), epsilon = 1e-22);
        assert_ne!(sample.atoms()[1].position, rotated.atoms()[1].position);
    }

    #[test]
    fn test_from_s2e_under_data() {
        let mut root = Group::new();
        root.insert_int("data/Z", ndarray::arr1(&[6_i64, 8]).into_dyn())
            .unwrap();
        root.insert_float("data/r", arr2(&[[0.0, 0.0, 0.0], [1e-10, 0.0, 0.0]]).into_dyn())
            .unwrap();

        let sample = Sample::from_s2e(&root).unwrap();
        assert_eq!(sample.len(), 2);
        assert_eq!(sample.atomic_numbers().to_vec(), vec![6, 8]);
        assert_eq!(sample.positions()[[1, 0]], 1e-10);
    }

    #[test]
    fn test_from_s2e_shape_mismatch() {
        let mut root = Group::new();
        root.insert_int("Z", ndarray::arr1(&[6_i64]).into_dyn()).unwrap();
        root.insert_float("r", arr2(&[[0.0, 0.0]]).into_dyn()).unwrap();
        assert!(matches!(
            Sample::from_s2e(&root),
            Err(SampleError::InvalidData(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Sample::from_file(&dir.path().join("missing.pdb")),
            Err(SampleError::NotFound(_))
        ));
    }
}
