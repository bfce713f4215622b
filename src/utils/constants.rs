/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Physical constants used throughout the s2e pipeline (CODATA 2018, SI units)

/// Speed of light in vacuum in m/s
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Electron rest mass in kg
pub const ELECTRON_MASS: f64 = 9.109_383_701_5e-31;

/// Elementary charge in C
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// Planck constant in J s
pub const PLANCK: f64 = 6.626_070_15e-34;

/// One electronvolt in joule
pub const ELECTRONVOLT: f64 = ELEMENTARY_CHARGE;

/// One Angstrom in meter
pub const ANGSTROM: f64 = 1.0e-10;

/// One nanometer in meter
pub const NANOMETER: f64 = 1.0e-9;

/// Factor between the standard deviation and the FWHM of a Gaussian
pub const SIGMA_TO_FWHM: f64 = 2.354_820_045_030_949;
