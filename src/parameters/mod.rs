/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Validated parameter objects for calculators
//!
//! Every parameter object can be built field by field (validated on
//! construction or through [`ParameterSet::validate`]) or from a key/value map
//! with `from_dictionary`, and serializes to JSON.

pub mod beam;
pub mod calculator;
pub mod detector;
pub mod diffractor;
pub mod dictionary;
pub mod errors;
pub mod pmi;

pub use beam::{PhotonBeamParameters, SpectrumType, DEFAULT_RELATIVE_BANDWIDTH};
pub use calculator::{CalculatorParameters, IntoParameters, ParameterSet};
pub use detector::{DetectorGeometry, DetectorPanel, DetectorSource, GEOMETRY_FILE_NAME};
pub use diffractor::PatternSimParameters;
pub use dictionary::ParameterDictionary;
pub use errors::{ParametersError, Result};
pub use pmi::PhotonMatterInteractorParameters;
