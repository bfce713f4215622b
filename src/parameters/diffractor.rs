/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Parameters of the pattern_sim photon diffractor

use super::beam::PhotonBeamParameters;
use super::calculator::{CalculatorParameters, IntoParameters, ParameterSet};
use super::detector::{DetectorGeometry, DetectorSource};
use super::dictionary::ParameterDictionary;
use super::errors::{ParametersError, Result};
use crate::utils::{check_positive, Length};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSimParameters {
    /// PDB file of the crystal's unit cell
    pub sample: PathBuf,
    #[serde(default)]
    pub beam_parameters: Option<PhotonBeamParameters>,
    pub detector_geometry: DetectorSource,
    #[serde(default = "default_pattern_count")]
    pub number_of_diffraction_patterns: usize,
    #[serde(default)]
    pub powder: bool,
    #[serde(default)]
    pub intensities_file: Option<PathBuf>,
    #[serde(default)]
    pub crystal_size_min: Option<Length>,
    #[serde(default)]
    pub crystal_size_max: Option<Length>,
    #[serde(default)]
    pub poissonize: bool,
    #[serde(default)]
    pub number_of_background_photons: u64,
    #[serde(default)]
    pub suppress_fringes: bool,
    #[serde(default = "default_true")]
    pub uniform_rotation: bool,
    #[serde(default)]
    pub use_gpu: bool,
    #[serde(default)]
    pub common: CalculatorParameters,
}

fn default_pattern_count() -> usize {
    1
}

fn default_true() -> bool {
    true
}

impl PatternSimParameters {
    pub fn new(sample: impl Into<PathBuf>, detector_geometry: impl Into<DetectorSource>) -> Self {
        Self {
            sample: sample.into(),
            beam_parameters: None,
            detector_geometry: detector_geometry.into(),
            number_of_diffraction_patterns: 1,
            powder: false,
            intensities_file: None,
            crystal_size_min: None,
            crystal_size_max: None,
            poissonize: false,
            number_of_background_photons: 0,
            suppress_fringes: false,
            uniform_rotation: true,
            use_gpu: false,
            common: CalculatorParameters::default(),
        }
    }

    /// Build from a parameter map; lengths in m, `detector_geometry` is a
    /// `.geom` path or a serialized geometry
    pub fn from_dictionary(value: Value) -> Result<Self> {
        let mut dict = ParameterDictionary::from_value(value)?;

        let sample = dict
            .path("sample")?
            .ok_or_else(|| ParametersError::invalid("sample", "is required"))?;
        let detector = match dict.value("detector_geometry")? {
            None => return Err(ParametersError::invalid("detector_geometry", "is required")),
            Some(Value::String(path)) => DetectorSource::File(PathBuf::from(path)),
            Some(other) => DetectorSource::Panels(serde_json::from_value::<DetectorGeometry>(other)?),
        };

        let mut parameters = Self::new(sample, detector);
        if let Some(beam) = dict.dictionary("beam_parameters")? {
            parameters.beam_parameters = Some(PhotonBeamParameters::from_dictionary(beam)?);
        }
        if let Some(count) = dict.usize("number_of_diffraction_patterns")? {
            parameters.number_of_diffraction_patterns = count;
        }
        if let Some(powder) = dict.bool(&["powder"])? {
            parameters.powder = powder;
        }
        parameters.intensities_file = dict.path("intensities_file")?;
        parameters.crystal_size_min = dict.f64("crystal_size_min")?.map(Length::from_meters);
        parameters.crystal_size_max = dict.f64("crystal_size_max")?.map(Length::from_meters);
        if let Some(poissonize) = dict.bool(&["poissonize"])? {
            parameters.poissonize = poissonize;
        }
        if let Some(background) = dict.u64("number_of_background_photons")? {
            parameters.number_of_background_photons = background;
        }
        if let Some(suppress) = dict.bool(&["suppress_fringes"])? {
            parameters.suppress_fringes = suppress;
        }
        if let Some(uniform) = dict.bool(&["uniform_rotation"])? {
            parameters.uniform_rotation = uniform;
        }
        if let Some(gpu) = dict.bool(&["use_gpu"])? {
            parameters.use_gpu = gpu;
        }
        parameters.common = CalculatorParameters::from_dictionary(&mut dict)?;
        dict.finish()?;

        parameters.validate()?;
        Ok(parameters)
    }
}

impl ParameterSet for PatternSimParameters {
    fn validate(&self) -> Result<()> {
        if !self.sample.is_file() {
            return Err(ParametersError::MissingFile(self.sample.clone()));
        }
        if let Some(intensities) = &self.intensities_file {
            if !intensities.is_file() {
                return Err(ParametersError::MissingFile(intensities.clone()));
            }
        }
        if self.number_of_diffraction_patterns < 1 {
            return Err(ParametersError::invalid(
                "number_of_diffraction_patterns",
                "must be at least 1",
            ));
        }
        if let Some(min) = self.crystal_size_min {
            check_positive("crystal_size_min", min.meters())?;
        }
        if let Some(max) = self.crystal_size_max {
            check_positive("crystal_size_max", max.meters())?;
        }
        if let (Some(min), Some(max)) = (self.crystal_size_min, self.crystal_size_max) {
            if min > max {
                return Err(ParametersError::invalid(
                    "crystal_size_min",
                    "must not exceed crystal_size_max",
                ));
            }
        }
        if let Some(beam) = &self.beam_parameters {
            beam.validate()?;
        }
        self.detector_geometry.validate()?;
        self.common.validate()
    }

    fn common(&self) -> &CalculatorParameters {
        &self.common
    }
}

impl IntoParameters<PatternSimParameters> for PatternSimParameters {
    fn into_parameters(self) -> Result<PatternSimParameters> {
        self.validate()?;
        Ok(self)
    }
}

impl IntoParameters<PatternSimParameters> for Value {
    fn into_parameters(self) -> Result<PatternSimParameters> {
        PatternSimParameters::from_dictionary(self)
    }
}
