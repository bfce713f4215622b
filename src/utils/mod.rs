/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Utility functions shared by the pipeline stages
//!
//! Physical constants, unit conversions, the typed quantities used by the
//! parameter objects, and number formatting for backengine text files.

pub mod constants;
pub mod conversions;
pub mod errors;
pub mod format;
pub mod units;

pub use conversions::{
    angstrom_to_meter, ev_to_joule, joule_to_ev, meter_to_angstrom, meter_to_nanometer,
    nanometer_to_meter, photon_energy_to_wavelength, wavelength_to_photon_energy,
};
pub use errors::UtilsError;
pub use format::format_exponent;
pub use units::{check_non_negative, check_positive, Angle, Energy, Length};
