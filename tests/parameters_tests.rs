/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

mod common;

use approx::assert_relative_eq;
use rstest::rstest;
use serde_json::{json, Value};
use simex_rs::parameters::{
    DetectorGeometry, ParameterSet, ParametersError, PatternSimParameters, PhotonBeamParameters,
    PhotonMatterInteractorParameters, SpectrumType,
};
use simex_rs::s2e::{new_document, Group, S2eInfo};
use simex_rs::utils::Length;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_beam_derived_quantities() {
    let beam = common::beam();
    // 2 mJ of 4.96 keV photons
    assert_relative_eq!(beam.number_of_photons(), 2.517e12, max_relative = 1e-3);
    assert_relative_eq!(beam.wavelength().angstroms(), 2.4997, max_relative = 1e-4);
    assert_relative_eq!(
        beam.focus_area().unwrap(),
        std::f64::consts::PI * 0.25e-14,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        beam.fluence().unwrap(),
        beam.number_of_photons() / beam.focus_area().unwrap(),
        max_relative = 1e-12
    );
}

#[test]
fn test_beam_through_s2e() {
    let beam = common::beam().with_spectrum_type(SpectrumType::Tophat);
    let mut root = new_document(&S2eInfo::new("m", "d")).unwrap();
    beam.write_s2e(root.ensure_group("params/beam").unwrap()).unwrap();

    let back = PhotonBeamParameters::from_s2e(&root).unwrap();
    assert_eq!(back.photon_energy_spectrum_type, SpectrumType::Tophat);
    assert_relative_eq!(
        back.photon_energy.electronvolts(),
        beam.photon_energy.electronvolts(),
        max_relative = 1e-12
    );
    assert_relative_eq!(
        back.beam_diameter_fwhm.unwrap().meters(),
        1e-7,
        max_relative = 1e-12
    );
}

#[test]
fn test_beam_missing_from_s2e() {
    let root = Group::new();
    assert!(matches!(
        PhotonBeamParameters::from_s2e(&root),
        Err(ParametersError::MissingBeam(_))
    ));
}

#[rstest]
#[case::negative_energy(json!({"photon_energy": -1.0, "pulse_energy": 1e-3}))]
#[case::zero_pulse(json!({"photon_energy": 8e3, "pulse_energy": 0.0}))]
#[case::bandwidth_too_large(json!({"photon_energy": 8e3, "pulse_energy": 1e-3, "relative_bandwidth": 1.5}))]
#[case::both_bandwidth_aliases(json!({"photon_energy": 8e3, "pulse_energy": 1e-3, "relative_bandwidth": 1e-3, "photon_energy_relative_bandwidth": 1e-3}))]
#[case::unknown_spectrum(json!({"photon_energy": 8e3, "pulse_energy": 1e-3, "photon_energy_spectrum_type": "rainbow"}))]
#[case::unknown_key(json!({"photon_energy": 8e3, "pulse_energy": 1e-3, "colour": "blue"}))]
fn test_pmi_beam_faulty_input(#[case] beam: Value) {
    let result = PhotonMatterInteractorParameters::from_dictionary(json!({ "beam_parameters": beam }));
    assert!(result.is_err());
}

#[test]
fn test_pmi_parameters_json_round_trip() {
    let parameters = PhotonMatterInteractorParameters::from_dictionary(json!({
        "rotation": [0.0, 0.0, 1.0, 0.0],
        "number_of_trajectories": 4,
        "number_of_steps": 50,
        "beam_parameters": {"photon_energy": 8.6e3, "pulse_energy": 1e-3, "beam_diameter_fwhm": 1e-7},
        "forced_mpi_command": "srun -n 4",
    }))
    .unwrap();
    assert_eq!(
        parameters.common.mpi_prefix("mpirun", 1),
        vec!["srun", "-n", "4"]
    );

    let text = parameters.to_json().unwrap();
    let back: PhotonMatterInteractorParameters = serde_json::from_str(&text).unwrap();
    assert_eq!(back, parameters);
    assert!(back.validate().is_ok());
}

#[test]
fn test_pattern_sim_parameters_with_geometry_file() {
    let dir = tempdir().unwrap();
    let sample = common::write_sample(dir.path());
    let geom = dir.path().join("detector.geom");
    common::detector().write_geom(&geom).unwrap();

    let parameters = PatternSimParameters::from_dictionary(json!({
        "sample": sample,
        "detector_geometry": geom,
        "number_of_diffraction_patterns": 10,
        "crystal_size_min": 1e-7,
        "crystal_size_max": 2e-7,
        "poissonize": true,
        "number_of_background_photons": 1000,
    }))
    .unwrap();
    assert_eq!(parameters.number_of_diffraction_patterns, 10);
    assert_eq!(parameters.crystal_size_max, Some(Length::from_meters(2e-7)));
    let geometry = parameters.detector_geometry.geometry().unwrap();
    assert_eq!(geometry.panels.len(), 1);
    assert_eq!(geometry.panels[0].fast_scan_pixels(), 16);
    assert_relative_eq!(
        geometry.panels[0].pixel_size.meters(),
        2.2e-4,
        max_relative = 1e-12
    );
}

#[test]
fn test_geometry_with_global_defaults() {
    let text = "\
; two panels sharing their distance and resolution
clen = 0.13
res = 5000
adu_per_photon = 1

p0/min_fs = 0
p0/max_fs = 31
p0/min_ss = 0
p0/max_ss = 31
p0/corner_x = -32
p0/corner_y = -16

p1/min_fs = 0
p1/max_fs = 31
p1/min_ss = 32
p1/max_ss = 63
p1/corner_x = 0
p1/corner_y = -16
p1/clen = 0.2
";
    let geometry = DetectorGeometry::from_geom_str(text).unwrap();
    assert_eq!(geometry.panels.len(), 2);
    assert_relative_eq!(geometry.panels[0].pixel_size.meters(), 2e-4, max_relative = 1e-12);
    assert_relative_eq!(
        geometry.panels[1].distance_from_interaction_plane.meters(),
        0.2,
        max_relative = 1e-12
    );
    assert_eq!(geometry.panels[1].slow_scan_pixels(), 32);
}

#[test]
fn test_geometry_parse_errors() {
    assert!(DetectorGeometry::from_geom_str("p0/min_fs 0\n").is_err());
    assert!(DetectorGeometry::from_geom_str("clen = 0.1\n").is_err());

    let dir = tempdir().unwrap();
    let missing = dir.path().join("absent.geom");
    assert!(DetectorGeometry::from_geom_file(&missing).is_err());
    fs::write(dir.path().join("empty.geom"), "").unwrap();
    assert!(DetectorGeometry::from_geom_file(&dir.path().join("empty.geom")).is_err());
}
