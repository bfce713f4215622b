/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Photon beam parameters

use super::dictionary::ParameterDictionary;
use super::errors::{ParametersError, Result};
use crate::s2e::{Dataset, Group};
use crate::utils::constants::SIGMA_TO_FWHM;
use crate::utils::{check_non_negative, check_positive, photon_energy_to_wavelength};
use crate::utils::{Angle, Energy, Length};
use log::debug;
use ndarray::{Array2, ArrayD, Dimension};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Bandwidth used when an upstream file does not record one
pub const DEFAULT_RELATIVE_BANDWIDTH: f64 = 1e-4;

/// Spectral shape of the pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpectrumType {
    #[default]
    #[serde(rename = "SASE", alias = "sase")]
    Sase,
    #[serde(rename = "tophat")]
    Tophat,
    #[serde(rename = "twocolour")]
    Twocolour,
}

impl SpectrumType {
    pub fn as_str(self) -> &'static str {
        match self {
            SpectrumType::Sase => "SASE",
            SpectrumType::Tophat => "tophat",
            SpectrumType::Twocolour => "twocolour",
        }
    }
}

impl fmt::Display for SpectrumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpectrumType {
    type Err = ParametersError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sase" => Ok(SpectrumType::Sase),
            "tophat" => Ok(SpectrumType::Tophat),
            "twocolour" | "twocolor" => Ok(SpectrumType::Twocolour),
            other => Err(ParametersError::invalid(
                "photon_energy_spectrum_type",
                format!("unknown spectrum type '{}'", other),
            )),
        }
    }
}

/// Photon beam description shared by PMI and diffraction stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotonBeamParameters {
    pub photon_energy: Energy,
    pub photon_energy_relative_bandwidth: f64,
    pub pulse_energy: Energy,
    #[serde(default)]
    pub beam_diameter_fwhm: Option<Length>,
    #[serde(default)]
    pub divergence: Option<Angle>,
    #[serde(default)]
    pub photon_energy_spectrum_type: SpectrumType,
}

impl PhotonBeamParameters {
    pub fn new(photon_energy: Energy, relative_bandwidth: f64, pulse_energy: Energy) -> Result<Self> {
        let beam = Self {
            photon_energy,
            photon_energy_relative_bandwidth: relative_bandwidth,
            pulse_energy,
            beam_diameter_fwhm: None,
            divergence: None,
            photon_energy_spectrum_type: SpectrumType::default(),
        };
        beam.validate()?;
        Ok(beam)
    }

    pub fn with_beam_diameter_fwhm(mut self, fwhm: Length) -> Result<Self> {
        check_positive("beam_diameter_fwhm", fwhm.meters())?;
        self.beam_diameter_fwhm = Some(fwhm);
        Ok(self)
    }

    pub fn with_divergence(mut self, divergence: Angle) -> Result<Self> {
        check_non_negative("divergence", divergence.radians())?;
        self.divergence = Some(divergence);
        Ok(self)
    }

    pub fn with_spectrum_type(mut self, spectrum: SpectrumType) -> Self {
        self.photon_energy_spectrum_type = spectrum;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_positive("photon_energy", self.photon_energy.joules())?;
        check_positive("pulse_energy", self.pulse_energy.joules())?;
        let bandwidth = self.photon_energy_relative_bandwidth;
        if !(bandwidth > 0.0 && bandwidth < 1.0) {
            return Err(ParametersError::invalid(
                "photon_energy_relative_bandwidth",
                format!("must lie strictly between 0 and 1, got {}", bandwidth),
            ));
        }
        if let Some(fwhm) = self.beam_diameter_fwhm {
            check_positive("beam_diameter_fwhm", fwhm.meters())?;
        }
        if let Some(divergence) = self.divergence {
            check_non_negative("divergence", divergence.radians())?;
        }
        Ok(())
    }

    /// Build from a parameter map; energies in eV / J, lengths in m, angles in rad
    pub fn from_dictionary(mut dict: ParameterDictionary) -> Result<Self> {
        let photon_energy = dict
            .f64("photon_energy")?
            .ok_or_else(|| ParametersError::invalid("photon_energy", "is required"))?;
        let pulse_energy = dict
            .f64("pulse_energy")?
            .ok_or_else(|| ParametersError::invalid("pulse_energy", "is required"))?;
        let bandwidth = match dict.take(&["photon_energy_relative_bandwidth", "relative_bandwidth"])? {
            None => DEFAULT_RELATIVE_BANDWIDTH,
            Some((key, value)) => value.as_f64().ok_or(ParametersError::WrongType {
                key,
                expected: "a number",
            })?,
        };

        let mut beam = Self::new(
            Energy::from_electronvolts(photon_energy),
            bandwidth,
            Energy::from_joules(pulse_energy),
        )?;
        if let Some(fwhm) = dict.f64("beam_diameter_fwhm")? {
            beam = beam.with_beam_diameter_fwhm(Length::from_meters(fwhm))?;
        }
        if let Some(divergence) = dict.f64("divergence")? {
            beam = beam.with_divergence(Angle::from_radians(divergence))?;
        }
        if let Some(spectrum) = dict.string("photon_energy_spectrum_type")? {
            beam = beam.with_spectrum_type(spectrum.parse()?);
        }
        dict.finish()?;
        Ok(beam)
    }

    pub fn number_of_photons(&self) -> f64 {
        self.pulse_energy.joules() / self.photon_energy.joules()
    }

    pub fn wavelength(&self) -> Length {
        Length::from_meters(photon_energy_to_wavelength(self.photon_energy.electronvolts()))
    }

    /// Area of the focal spot in m², `π (fwhm / 2)²`
    pub fn focus_area(&self) -> Option<f64> {
        self.beam_diameter_fwhm.map(|fwhm| {
            let radius = fwhm.meters() / 2.0;
            PI * radius * radius
        })
    }

    /// Photons per m² in the focal spot
    pub fn fluence(&self) -> Option<f64> {
        self.focus_area().map(|area| self.number_of_photons() / area)
    }

    /// Extract the beam from an upstream s2e file (source or propagation output)
    pub fn from_s2e(root: &Group) -> Result<Self> {
        let photon_energy = ["params/photonEnergy", "params/beam/photonEnergy"]
            .iter()
            .find(|path| root.contains(path))
            .map(|path| root.float_scalar(path))
            .transpose()?
            .ok_or_else(|| ParametersError::MissingBeam("no photon energy recorded".to_string()))?;
        let pulse_energy = root
            .float_scalar("params/beam/pulseEnergy")
            .map_err(|_| ParametersError::MissingBeam("no pulse energy recorded".to_string()))?;
        let bandwidth = if root.contains("params/beam/relativeBandwidth") {
            root.float_scalar("params/beam/relativeBandwidth")?
        } else {
            DEFAULT_RELATIVE_BANDWIDTH
        };

        let mut beam = Self::new(
            Energy::from_electronvolts(photon_energy),
            bandwidth,
            Energy::from_joules(pulse_energy),
        )?;

        let fwhm = if root.contains("params/beam/focusFWHM") {
            Some(root.float_scalar("params/beam/focusFWHM")?)
        } else {
            wavefront_fwhm(root)?
        };
        if let Some(fwhm) = fwhm {
            beam = beam.with_beam_diameter_fwhm(Length::from_meters(fwhm))?;
        }
        if root.contains("params/beam/divergence") {
            beam = beam.with_divergence(Angle::from_radians(
                root.float_scalar("params/beam/divergence")?,
            ))?;
        }
        if let Ok(spectrum) = root.text("params/beam/photonEnergySpectrumType") {
            beam = beam.with_spectrum_type(spectrum.parse()?);
        }
        debug!(
            "Beam from s2e file: {}, {:.3e} photons, fwhm {:?}",
            beam.photon_energy,
            beam.number_of_photons(),
            beam.beam_diameter_fwhm.map(|l| l.meters())
        );
        Ok(beam)
    }

    /// Write the beam datasets into `group` (typically `params/beam`)
    pub fn write_s2e(&self, group: &mut Group) -> Result<()> {
        group.insert(
            "photonEnergy",
            Dataset::scalar(self.photon_energy.electronvolts()).with_attr("units", "eV"),
        )?;
        group.insert(
            "pulseEnergy",
            Dataset::scalar(self.pulse_energy.joules()).with_attr("units", "J"),
        )?;
        group.insert(
            "relativeBandwidth",
            Dataset::scalar(self.photon_energy_relative_bandwidth),
        )?;
        group.insert("numberOfPhotons", Dataset::scalar(self.number_of_photons()))?;
        group.insert_text("photonEnergySpectrumType", self.photon_energy_spectrum_type.as_str())?;
        if let (Some(fwhm), Some(area)) = (self.beam_diameter_fwhm, self.focus_area()) {
            group.insert(
                "focusFWHM",
                Dataset::scalar(fwhm.meters()).with_attr("units", "m"),
            )?;
            group.insert("focusArea", Dataset::scalar(area).with_attr("units", "m^2"))?;
        }
        if let Some(divergence) = self.divergence {
            group.insert(
                "divergence",
                Dataset::scalar(divergence.radians()).with_attr("units", "rad"),
            )?;
        }
        Ok(())
    }
}

/// FWHM of a wavefront's time-integrated intensity, from its second moments.
///
/// `data/arrEhor` and `data/arrEver` hold the field on an `ny x nx` grid in the
/// two leading axes; every remaining axis (slices, real/imaginary) is summed
/// over in `|E|²`. The grid extent comes from `params/Mesh`. Returns `None`
/// when the file carries no wavefront.
fn wavefront_fwhm(root: &Group) -> Result<Option<f64>> {
    if !root.contains("data/arrEhor") || !root.contains("params/Mesh") {
        return Ok(None);
    }
    let horizontal = root.float_array("data/arrEhor")?;
    let vertical = if root.contains("data/arrEver") {
        Some(root.float_array("data/arrEver")?)
    } else {
        None
    };

    let x_min = root.float_scalar("params/Mesh/xMin")?;
    let x_max = root.float_scalar("params/Mesh/xMax")?;
    let y_min = root.float_scalar("params/Mesh/yMin")?;
    let y_max = root.float_scalar("params/Mesh/yMax")?;

    let shape = horizontal.shape();
    if shape.len() < 2 {
        return Err(ParametersError::invalid(
            "data/arrEhor",
            "wavefront must have at least two axes",
        ));
    }
    let (ny, nx) = (shape[0], shape[1]);
    let mut intensity = Array2::<f64>::zeros((ny, nx));
    accumulate_intensity(&mut intensity, &horizontal);
    if let Some(vertical) = &vertical {
        if vertical.shape() != horizontal.shape() {
            return Err(ParametersError::invalid(
                "data/arrEver",
                "shape differs from data/arrEhor",
            ));
        }
        accumulate_intensity(&mut intensity, vertical);
    }

    let coordinate = |min: f64, max: f64, n: usize, i: usize| {
        if n > 1 {
            min + (max - min) * i as f64 / (n - 1) as f64
        } else {
            0.5 * (min + max)
        }
    };

    let total: f64 = intensity.sum();
    if total <= 0.0 || !total.is_finite() {
        return Ok(None);
    }
    let (mut mean_x, mut mean_y) = (0.0, 0.0);
    for ((iy, ix), value) in intensity.indexed_iter() {
        mean_x += value * coordinate(x_min, x_max, nx, ix);
        mean_y += value * coordinate(y_min, y_max, ny, iy);
    }
    mean_x /= total;
    mean_y /= total;

    let (mut var_x, mut var_y) = (0.0, 0.0);
    for ((iy, ix), value) in intensity.indexed_iter() {
        let dx = coordinate(x_min, x_max, nx, ix) - mean_x;
        let dy = coordinate(y_min, y_max, ny, iy) - mean_y;
        var_x += value * dx * dx;
        var_y += value * dy * dy;
    }
    var_x /= total;
    var_y /= total;

    // diameter of the circle with the same area as the sigma ellipse
    let sigma = (var_x.sqrt() * var_y.sqrt()).sqrt();
    if sigma <= 0.0 {
        return Ok(None);
    }
    Ok(Some(SIGMA_TO_FWHM * sigma))
}

fn accumulate_intensity(intensity: &mut Array2<f64>, field: &ArrayD<f64>) {
    for (index, value) in field.indexed_iter() {
        let index = index.slice();
        intensity[[index[0], index[1]]] += value * value;
    }
}
