/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Atomistic samples
//!
//! Element data, PDB parsing, sample structures and sample orientations.

pub mod database;
pub mod errors;
pub mod pdb;
pub mod rotation;
pub mod structure;

pub use database::{atomic_number_from_symbol, atomic_weight, element_symbol, MAX_ATOMIC_NUMBER};
pub use errors::{Result, SampleError};
pub use pdb::parse_pdb;
pub use rotation::Quaternion;
pub use structure::{Sample, SampleAtom};
