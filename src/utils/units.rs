/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Typed physical quantities
//!
//! Parameter objects carry dimensioned values through these newtypes instead of
//! bare `f64`. Each quantity stores its SI value and serializes as that value.

use super::constants;
use super::errors::{Result, UtilsError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Check that `value` is finite and strictly positive
pub fn check_positive(quantity: &'static str, value: f64) -> Result<f64> {
    check_non_negative(quantity, value)?;
    if value == 0.0 {
        return Err(UtilsError::OutOfRange {
            quantity,
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

/// Check that `value` is finite and not negative
pub fn check_non_negative(quantity: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(UtilsError::NotFinite { quantity, value });
    }
    if value < 0.0 {
        return Err(UtilsError::OutOfRange {
            quantity,
            message: format!("must not be negative, got {}", value),
        });
    }
    Ok(value)
}

/// An energy, stored in joule
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Energy(f64);

impl Energy {
    pub fn from_joules(joules: f64) -> Self {
        Self(joules)
    }

    pub fn from_electronvolts(ev: f64) -> Self {
        Self(ev * constants::ELECTRONVOLT)
    }

    pub fn joules(self) -> f64 {
        self.0
    }

    pub fn electronvolts(self) -> f64 {
        self.0 / constants::ELECTRONVOLT
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} eV", self.electronvolts())
    }
}

/// A length, stored in meter
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Length(f64);

impl Length {
    pub fn from_meters(meters: f64) -> Self {
        Self(meters)
    }

    pub fn from_nanometers(nanometers: f64) -> Self {
        Self(nanometers * constants::NANOMETER)
    }

    pub fn from_angstroms(angstroms: f64) -> Self {
        Self(angstroms * constants::ANGSTROM)
    }

    pub fn meters(self) -> f64 {
        self.0
    }

    pub fn nanometers(self) -> f64 {
        self.0 / constants::NANOMETER
    }

    pub fn angstroms(self) -> f64 {
        self.0 / constants::ANGSTROM
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} m", self.0)
    }
}

/// A plane angle, stored in radian
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Angle(f64);

impl Angle {
    pub fn from_radians(radians: f64) -> Self {
        Self(radians)
    }

    pub fn from_degrees(degrees: f64) -> Self {
        Self(degrees.to_radians())
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    pub fn degrees(self) -> f64 {
        self.0.to_degrees()
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rad", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_energy_round_trip() {
        let energy = Energy::from_electronvolts(4.96e3);
        assert_relative_eq!(energy.electronvolts(), 4.96e3, epsilon = 1e-9);
        assert_relative_eq!(energy.joules(), 4.96e3 * constants::ELECTRONVOLT);
    }

    #[test]
    fn test_length_units() {
        let length = Length::from_nanometers(100.0);
        assert_relative_eq!(length.meters(), 1.0e-7);
        assert_relative_eq!(length.angstroms(), 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_positive_checks() {
        assert!(check_positive("pulse energy", 1.0e-3).is_ok());
        assert!(check_positive("pulse energy", 0.0).is_err());
        assert!(check_positive("pulse energy", f64::NAN).is_err());
        assert!(check_non_negative("divergence", 0.0).is_ok());
        assert!(check_non_negative("divergence", -1.0).is_err());
    }

    #[test]
    fn test_serializes_as_si_value() {
        let json = serde_json::to_string(&Length::from_meters(2.0e-6)).unwrap();
        assert_eq!(json, "2e-6");
    }
}
