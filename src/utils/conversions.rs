/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Unit conversion utilities

use super::constants;

/// Convert from Angstroms to meters
pub fn angstrom_to_meter(angstrom: f64) -> f64 {
    angstrom * constants::ANGSTROM
}

/// Convert from meters to Angstroms
pub fn meter_to_angstrom(meter: f64) -> f64 {
    meter / constants::ANGSTROM
}

/// Convert from nanometers to meters
pub fn nanometer_to_meter(nanometer: f64) -> f64 {
    nanometer * constants::NANOMETER
}

/// Convert from meters to nanometers
pub fn meter_to_nanometer(meter: f64) -> f64 {
    meter / constants::NANOMETER
}

/// Convert energy from eV to joule
pub fn ev_to_joule(ev: f64) -> f64 {
    ev * constants::ELECTRONVOLT
}

/// Convert energy from joule to eV
pub fn joule_to_ev(joule: f64) -> f64 {
    joule / constants::ELECTRONVOLT
}

/// Photon wavelength in meters for a photon energy given in eV
pub fn photon_energy_to_wavelength(ev: f64) -> f64 {
    constants::PLANCK * constants::SPEED_OF_LIGHT / ev_to_joule(ev)
}

/// Photon energy in eV for a wavelength given in meters
pub fn wavelength_to_photon_energy(wavelength: f64) -> f64 {
    joule_to_ev(constants::PLANCK * constants::SPEED_OF_LIGHT / wavelength)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_conversions() {
        let angstrom = 1.5;
        let meter = angstrom_to_meter(angstrom);
        assert_relative_eq!(meter_to_angstrom(meter), angstrom, epsilon = 1e-12);

        let ev = 8.6e3;
        let joule = ev_to_joule(ev);
        assert_relative_eq!(joule_to_ev(joule), ev, epsilon = 1e-9);
        assert_relative_eq!(meter_to_nanometer(nanometer_to_meter(12.0)), 12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_photon_wavelength() {
        // 12.398 keV photons have a wavelength of ~1 Angstrom
        let wavelength = photon_energy_to_wavelength(12_398.419_843);
        assert_relative_eq!(wavelength, 1.0e-10, max_relative = 1e-6);
        assert_relative_eq!(wavelength_to_photon_energy(wavelength), 12_398.419_843, max_relative = 1e-9);
    }
}
