/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Reader for the coordinate records of Protein Data Bank files

use super::database::atomic_number_from_symbol;
use super::errors::{Result, SampleError};
use super::structure::SampleAtom;
use crate::utils::angstrom_to_meter;

/// Fixed-column field of a PDB record (1-based, inclusive columns)
fn field(line: &str, first: usize, last: usize) -> Option<&str> {
    let end = last.min(line.len());
    if first > end {
        return None;
    }
    line.get(first - 1..end).map(str::trim).filter(|s| !s.is_empty())
}

fn coordinate(line: &str, first: usize, last: usize, line_number: usize) -> Result<f64> {
    let text = field(line, first, last).ok_or_else(|| SampleError::PdbParse {
        line: line_number,
        message: format!("missing coordinate in columns {}-{}", first, last),
    })?;
    text.parse::<f64>().map_err(|_| SampleError::PdbParse {
        line: line_number,
        message: format!("invalid coordinate '{}'", text),
    })
}

/// Element of an atom record: columns 77-78, else derived from the atom name.
///
/// Atom names with a blank first column carry a one-letter element right
/// after it (" CA " is a carbon); otherwise the first two letters are tried.
fn element(line: &str, line_number: usize) -> Result<u32> {
    if let Some(symbol) = field(line, 77, 78) {
        return atomic_number_from_symbol(symbol)
            .ok_or_else(|| SampleError::UnknownElement(symbol.to_string()));
    }

    let name = line.get(12..16.min(line.len())).unwrap_or_default();
    let letters: String = name
        .trim()
        .chars()
        .skip_while(|c| c.is_ascii_digit())
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return Err(SampleError::PdbParse {
            line: line_number,
            message: "record has neither an element symbol nor an atom name".to_string(),
        });
    }

    if !name.starts_with(' ') && letters.len() >= 2 {
        if let Some(z) = atomic_number_from_symbol(&letters[..2]) {
            return Ok(z);
        }
    }
    atomic_number_from_symbol(&letters[..1])
        .ok_or_else(|| SampleError::UnknownElement(letters.clone()))
}

/// Parse the `ATOM` and `HETATM` records of a PDB text; positions in meters
pub fn parse_pdb(text: &str) -> Result<Vec<SampleAtom>> {
    let mut atoms = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let record = line.get(..6.min(line.len())).unwrap_or_default().trim_end();
        if record == "ENDMDL" {
            // only the first model of multi-model files
            break;
        }
        if record != "ATOM" && record != "HETATM" {
            continue;
        }

        let x = coordinate(line, 31, 38, line_number)?;
        let y = coordinate(line, 39, 46, line_number)?;
        let z = coordinate(line, 47, 54, line_number)?;
        atoms.push(SampleAtom {
            atomic_number: element(line, line_number)?,
            position: [angstrom_to_meter(x), angstrom_to_meter(y), angstrom_to_meter(z)],
        });
    }
    Ok(atoms)
}
