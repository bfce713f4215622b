/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Photon-matter interaction parameters

use super::beam::PhotonBeamParameters;
use super::calculator::{CalculatorParameters, IntoParameters, ParameterSet};
use super::dictionary::ParameterDictionary;
use super::errors::{ParametersError, Result};
use crate::s2e::{Dataset, Group};
use crate::sample::Quaternion;
use ndarray::arr1;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Settings of a photon-matter interaction (molecular dynamics) run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotonMatterInteractorParameters {
    /// Sample orientation as `[w, x, y, z]`
    pub rotation: [f64; 4],
    pub calculate_compton: bool,
    pub number_of_trajectories: usize,
    pub number_of_steps: usize,
    /// Draw a uniformly random orientation per trajectory
    pub random_rotation: bool,
    pub random_seed: Option<u64>,
    pub beam_parameters: Option<PhotonBeamParameters>,
    pub common: CalculatorParameters,
}

impl Default for PhotonMatterInteractorParameters {
    fn default() -> Self {
        Self {
            rotation: Quaternion::identity().to_array(),
            calculate_compton: false,
            number_of_trajectories: 1,
            number_of_steps: 100,
            random_rotation: false,
            random_seed: None,
            beam_parameters: None,
            common: CalculatorParameters::default(),
        }
    }
}

impl PhotonMatterInteractorParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rotation from a list of components; exactly four are required
    pub fn set_rotation(&mut self, components: &[f64]) -> Result<()> {
        let components: [f64; 4] = components.try_into().map_err(|_| {
            ParametersError::invalid(
                "rotation",
                format!("expected 4 quaternion components, got {}", components.len()),
            )
        })?;
        Quaternion::from_array(components)?;
        self.rotation = components;
        Ok(())
    }

    pub fn quaternion(&self) -> Result<Quaternion> {
        Ok(Quaternion::from_array(self.rotation)?)
    }

    /// Build from a parameter map.
    ///
    /// Accepts `calculate_Compton` as an alias of `calculate_compton`; beam
    /// parameters may be given as a nested map under `beam_parameters`.
    pub fn from_dictionary(value: Value) -> Result<Self> {
        let mut dict = ParameterDictionary::from_value(value)?;
        let mut parameters = Self::default();

        if let Some(rotation) = dict.float_list("rotation")? {
            parameters.set_rotation(&rotation)?;
        }
        if let Some(compton) = dict.bool(&["calculate_compton", "calculate_Compton"])? {
            parameters.calculate_compton = compton;
        }
        if let Some(trajectories) = dict.usize("number_of_trajectories")? {
            parameters.number_of_trajectories = trajectories;
        }
        if let Some(steps) = dict.usize("number_of_steps")? {
            parameters.number_of_steps = steps;
        }
        if let Some(random) = dict.bool(&["random_rotation"])? {
            parameters.random_rotation = random;
        }
        parameters.random_seed = dict.u64("random_seed")?;
        if let Some(beam) = dict.dictionary("beam_parameters")? {
            parameters.beam_parameters = Some(PhotonBeamParameters::from_dictionary(beam)?);
        }
        parameters.common = CalculatorParameters::from_dictionary(&mut dict)?;
        dict.finish()?;

        parameters.validate()?;
        Ok(parameters)
    }

    /// Write the parameters into `group` (typically `params/pmi`)
    pub fn write_s2e(&self, group: &mut Group) -> Result<()> {
        group.insert_float("rotation", arr1(&self.rotation).into_dyn())?;
        group.insert(
            "calculateCompton",
            Dataset::int(arr1(&[self.calculate_compton as i64]).into_dyn()),
        )?;
        group.insert_scalar("numberOfSteps", self.number_of_steps as f64)?;
        group.insert_scalar("numberOfTrajectories", self.number_of_trajectories as f64)?;
        group.insert(
            "randomRotation",
            Dataset::int(arr1(&[self.random_rotation as i64]).into_dyn()),
        )?;
        Ok(())
    }
}

impl ParameterSet for PhotonMatterInteractorParameters {
    fn validate(&self) -> Result<()> {
        let rotation = self.quaternion()?;
        if self.number_of_trajectories < 1 {
            return Err(ParametersError::invalid(
                "number_of_trajectories",
                "must be at least 1",
            ));
        }
        if self.number_of_steps < 1 {
            return Err(ParametersError::invalid("number_of_steps", "must be at least 1"));
        }
        if self.random_rotation && !rotation.is_identity() {
            return Err(ParametersError::Conflict(
                "random_rotation cannot be combined with an explicit rotation".to_string(),
            ));
        }
        if let Some(beam) = &self.beam_parameters {
            beam.validate()?;
        }
        self.common.validate()
    }

    fn common(&self) -> &CalculatorParameters {
        &self.common
    }
}

impl IntoParameters<PhotonMatterInteractorParameters> for PhotonMatterInteractorParameters {
    fn into_parameters(self) -> Result<PhotonMatterInteractorParameters> {
        self.validate()?;
        Ok(self)
    }
}

impl IntoParameters<PhotonMatterInteractorParameters> for Value {
    fn into_parameters(self) -> Result<PhotonMatterInteractorParameters> {
        PhotonMatterInteractorParameters::from_dictionary(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_default_construction() {
        let parameters = PhotonMatterInteractorParameters::new();
        assert_eq!(parameters.rotation, [1.0, 0.0, 0.0, 0.0]);
        assert!(!parameters.calculate_compton);
        assert_eq!(parameters.number_of_trajectories, 1);
        assert_eq!(parameters.number_of_steps, 100);
        assert_eq!(parameters.common.cpus_per_task, 1);
        assert!(parameters.validate().is_ok());
    }

    #[test]
    fn test_shaped_construction() {
        let parameters = PhotonMatterInteractorParameters::from_dictionary(json!({
            "rotation": [-0.5, 0.5, 0.5, 0.5],
            "calculate_Compton": true,
            "number_of_trajectories": 100,
        }))
        .unwrap();
        assert_eq!(parameters.rotation, [-0.5, 0.5, 0.5, 0.5]);
        assert!(parameters.calculate_compton);
        assert_eq!(parameters.number_of_trajectories, 100);
    }

    #[rstest]
    #[case::scalar(json!({"rotation": 2.0}))]
    #[case::empty(json!({"rotation": []}))]
    #[case::too_short(json!({"rotation": [1.0, 0, 0]}))]
    #[case::not_numbers(json!({"rotation": [1, "O", "O", "P"]}))]
    #[case::zero_norm(json!({"rotation": [0, 0, 0, 0]}))]
    #[case::zero_trajectories(json!({"number_of_trajectories": 0}))]
    #[case::unknown_key(json!({"number_of_stepz": 10}))]
    #[case::wrong_type(json!({"calculate_compton": "yes"}))]
    #[case::rotation_conflict(json!({"random_rotation": true, "rotation": [0, 1, 0, 0]}))]
    fn test_faulty_input(#[case] value: Value) {
        assert!(PhotonMatterInteractorParameters::from_dictionary(value).is_err());
    }

    #[test]
    fn test_nested_beam() {
        let parameters = PhotonMatterInteractorParameters::from_dictionary(json!({
            "random_rotation": true,
            "random_seed": 42,
            "beam_parameters": {"photon_energy": 8.6e3, "pulse_energy": 1.5e-3},
            "cpus_per_task": 4,
        }))
        .unwrap();
        assert_eq!(parameters.random_seed, Some(42));
        assert!(parameters.beam_parameters.is_some());
        assert_eq!(parameters.common.cpus_per_task, 4);
    }

    #[test]
    fn test_json_export() {
        let parameters = PhotonMatterInteractorParameters::new();
        let text = parameters.to_json().unwrap();
        let back: PhotonMatterInteractorParameters = serde_json::from_str(&text).unwrap();
        assert_eq!(back, parameters);
    }
}
