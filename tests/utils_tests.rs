/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

use approx::assert_relative_eq;
use simex_rs::utils::{
    angstrom_to_meter, constants, ev_to_joule, format_exponent, joule_to_ev, meter_to_angstrom,
    photon_energy_to_wavelength, wavelength_to_photon_energy, Angle, Energy, Length,
};

#[test]
fn test_unit_conversions() {
    let angstrom_value = 2.5;
    let meter_value = angstrom_to_meter(angstrom_value);
    assert_relative_eq!(meter_value, 2.5e-10, epsilon = 1e-22);
    assert_relative_eq!(meter_to_angstrom(meter_value), angstrom_value, epsilon = 1e-10);

    let ev_value = 8.6e3;
    let joule_value = ev_to_joule(ev_value);
    assert_relative_eq!(joule_value, ev_value * constants::ELEMENTARY_CHARGE, max_relative = 1e-12);
    assert_relative_eq!(joule_to_ev(joule_value), ev_value, max_relative = 1e-12);
}

#[test]
fn test_photon_wavelength() {
    // 12.398 keV photons have a wavelength of 1 Å
    let wavelength = photon_energy_to_wavelength(12_398.419_843);
    assert_relative_eq!(wavelength, 1e-10, max_relative = 1e-8);
    assert_relative_eq!(
        wavelength_to_photon_energy(wavelength),
        12_398.419_843,
        max_relative = 1e-12
    );
}

#[test]
fn test_typed_quantities() {
    let energy = Energy::from_electronvolts(4.96e3);
    assert_relative_eq!(energy.joules(), ev_to_joule(4.96e3), max_relative = 1e-12);
    assert!(Energy::from_joules(1e-3) > energy);

    let length = Length::from_nanometers(100.0);
    assert_relative_eq!(length.meters(), 1e-7, max_relative = 1e-12);
    assert_relative_eq!(length.angstroms(), 1000.0, max_relative = 1e-12);

    let angle = Angle::from_degrees(180.0);
    assert_relative_eq!(angle.radians(), std::f64::consts::PI, max_relative = 1e-12);

    // serialized as bare SI numbers
    assert_eq!(serde_json::to_string(&Length::from_meters(0.5)).unwrap(), "0.5");
}

#[test]
fn test_format_exponent() {
    assert_eq!(format_exponent(2.0e-3, 6, true), "2.000000E-03");
    assert_eq!(format_exponent(4960.0, 3, false), "4.960e+03");
}
