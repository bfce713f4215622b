/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! pattern_sim photon diffractor
//!
//! Runs CrystFEL's `pattern_sim` on a crystal sample and collects the
//! patterns into s2e files `<output>/diffr_out_<k:07>.h5`, indexed by a master
//! file `<output>.h5`.

use super::backengine::Backengine;
use super::dump::CalculatorDump;
use super::errors::{CalculatorError, Result};
use super::Calculator;
use crate::config::PlatformConfig;
use crate::parameters::{IntoParameters, ParameterSet, PatternSimParameters, PhotonBeamParameters};
use crate::s2e::{
    link_parent, new_document, numbered_file_name, pattern_group_name, read_tree,
    validate_layout, write_tree, Group, S2eInfo,
};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_PATH: &str = "diffr";
const OUTPUT_PREFIX: &str = "diffr_out";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSimPhotonDiffractor {
    parameters: PatternSimParameters,
    input_path: Option<PathBuf>,
    /// Directory pattern_sim writes into
    pattern_dir: PathBuf,
    /// `pattern_dir` until `save_h5` has written the master file
    output_path: PathBuf,
    #[serde(default)]
    config: PlatformConfig,
}

impl PatternSimPhotonDiffractor {
    /// Diffractor for `parameters`.
    ///
    /// Without beam parameters, the beam is read from `input_path` (an upstream
    /// s2e file or a directory of them); construction fails when neither
    /// provides one.
    pub fn new<P>(parameters: P, input_path: Option<PathBuf>, output_path: Option<PathBuf>) -> Result<Self>
    where
        P: IntoParameters<PatternSimParameters>,
    {
        let mut parameters = parameters.into_parameters()?;
        if parameters.beam_parameters.is_none() {
            let input = input_path.as_deref().ok_or_else(|| {
                CalculatorError::InvalidInput(
                    "pattern_sim needs beam parameters or an input file to read them from".to_string(),
                )
            })?;
            // the input may not exist yet when the diffractor is part of a pipeline
            if input.exists() {
                parameters.beam_parameters = Some(beam_from_input(input)?);
            }
        }
        let pattern_dir = output_path.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH));
        Ok(Self {
            parameters,
            input_path,
            output_path: pattern_dir.clone(),
            pattern_dir,
            config: PlatformConfig::default(),
        })
    }

    pub fn with_config(mut self, config: PlatformConfig) -> Self {
        self.config = config;
        self
    }

    pub fn parameters(&self) -> &PatternSimParameters {
        &self.parameters
    }

    fn beam(&mut self) -> Result<PhotonBeamParameters> {
        if let Some(beam) = &self.parameters.beam_parameters {
            return Ok(beam.clone());
        }
        let input = self
            .input_path
            .clone()
            .ok_or_else(|| CalculatorError::InvalidInput("no beam parameters".to_string()))?;
        let beam = beam_from_input(&input)?;
        self.parameters.beam_parameters = Some(beam.clone());
        Ok(beam)
    }

    /// Native files written by pattern_sim, in pattern order
    pub fn native_output_files(&self) -> Vec<PathBuf> {
        let count = self.parameters.number_of_diffraction_patterns;
        if count == 1 {
            vec![self.pattern_dir.join(numbered_file_name(OUTPUT_PREFIX, 1))]
        } else {
            (1..=count)
                .map(|k| self.pattern_dir.join(format!("{}-{}.h5", OUTPUT_PREFIX, k)))
                .collect()
        }
    }

    /// The pattern_sim command line, without the program name
    pub fn command_arguments(&self, beam: &PhotonBeamParameters, geometry: &Path) -> Vec<String> {
        let p = &self.parameters;
        let output = if p.number_of_diffraction_patterns == 1 {
            self.pattern_dir.join(numbered_file_name(OUTPUT_PREFIX, 1))
        } else {
            self.pattern_dir.join(format!("{}.h5", OUTPUT_PREFIX))
        };

        let mut args = vec![
            "-p".to_string(),
            p.sample.display().to_string(),
            format!("--geometry={}", geometry.display()),
            format!("--output={}", output.display()),
            format!("--number={}", p.number_of_diffraction_patterns),
            format!("--photon-energy={}", beam.photon_energy.electronvolts()),
            format!("--nphotons={:e}", beam.number_of_photons()),
            format!(
                "--beam-bandwidth={}",
                beam.photon_energy_relative_bandwidth
            ),
            format!("--spectrum={}", spectrum_option(beam)),
        ];
        if let Some(fwhm) = beam.beam_diameter_fwhm {
            args.push(format!("--beam-radius={:e}", fwhm.meters() / 2.0));
        }
        if p.use_gpu {
            args.push("--gpu".to_string());
        }
        if p.uniform_rotation {
            args.push("--random-orientation".to_string());
            args.push("--really-random".to_string());
        }
        if p.powder {
            args.push(format!(
                "--powder={}",
                self.pattern_dir.join("powder.h5").display()
            ));
        }
        if let Some(intensities) = &p.intensities_file {
            args.push(format!("--intensities={}", intensities.display()));
        }
        if let Some(min) = p.crystal_size_min {
            args.push(format!("--min-size={}", min.nanometers()));
        }
        if let Some(max) = p.crystal_size_max {
            args.push(format!("--max-size={}", max.nanometers()));
        }
        if !p.poissonize {
            args.push("--no-noise".to_string());
        }
        if p.number_of_background_photons > 0 {
            args.push(format!("--background={}", p.number_of_background_photons));
        }
        if p.suppress_fringes {
            args.push("--no-fringes".to_string());
        }
        args
    }

    /// s2e document for one native pattern file
    fn normalize_pattern(
        &self,
        native: &Path,
        beam: &PhotonBeamParameters,
        geometry: &Group,
    ) -> Result<Group> {
        let pattern = read_tree(native)?;
        let data = pattern.float_array("data/data")?;
        if data.ndim() != 2 {
            return Err(CalculatorError::Parse {
                path: native.to_path_buf(),
                message: format!("expected a 2D pattern, found shape {:?}", data.shape()),
            });
        }

        let info = S2eInfo::new(
            "Diffraction pattern simulated with pattern_sim (CrystFEL)",
            "Photon counts per detector pixel",
        );
        let mut root = new_document(&info)?;
        root.insert_float("data/data", data)?;
        beam.write_s2e(root.ensure_group("params/beam")?)?;
        root.insert("params/geom", geometry.clone())?;
        if let Some(input) = &self.input_path {
            if input.is_file() {
                link_parent(&mut root, input)?;
            }
        }
        Ok(root)
    }
}

/// Spectrum name as pattern_sim expects it
fn spectrum_option(beam: &PhotonBeamParameters) -> String {
    beam.photon_energy_spectrum_type.as_str().to_ascii_lowercase()
}

/// Beam of the first upstream s2e file that records one
fn beam_from_input(input: &Path) -> Result<PhotonBeamParameters> {
    let candidates = if input.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(input)
            .map_err(|e| CalculatorError::io(input, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().map(|ext| ext == "h5").unwrap_or(false))
            .collect();
        files.sort();
        files
    } else if input.is_file() {
        vec![input.to_path_buf()]
    } else {
        return Err(CalculatorError::MissingInput(input.to_path_buf()));
    };

    for candidate in &candidates {
        match read_tree(candidate).map(|root| PhotonBeamParameters::from_s2e(&root)) {
            Ok(Ok(beam)) => {
                debug!("Beam taken from {}", candidate.display());
                return Ok(beam);
            }
            Ok(Err(e)) => debug!("{}: {}", candidate.display(), e),
            Err(e) => debug!("{}: {}", candidate.display(), e),
        }
    }
    Err(CalculatorError::InvalidInput(format!(
        "no beam parameters found in {}",
        input.display()
    )))
}

impl Calculator for PatternSimPhotonDiffractor {
    fn name(&self) -> &'static str {
        "pattern_sim"
    }

    fn input_path(&self) -> Option<&Path> {
        self.input_path.as_deref()
    }

    fn set_input_path(&mut self, path: PathBuf) {
        self.input_path = Some(path);
    }

    fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn backengine(&mut self) -> Result<i32> {
        self.parameters.validate()?;
        let beam = self.beam()?;
        fs::create_dir_all(&self.pattern_dir)
            .map_err(|e| CalculatorError::io(&self.pattern_dir, e))?;
        let geometry = self
            .parameters
            .detector_geometry
            .geom_file(&self.pattern_dir)?;

        let (env_key, env_value) = self.parameters.common.thread_env();
        let output = Backengine::new(&self.config.executables.pattern_sim)
            .prefix(
                self.parameters
                    .common
                    .mpi_prefix(&self.config.mpi_launcher, 1),
            )
            .args(self.command_arguments(&beam, &geometry))
            .env(env_key, env_value)
            .run()?;
        if !output.success() {
            warn!("pattern_sim failed with status {}", output.status);
        }
        Ok(output.status)
    }

    fn save_h5(&mut self) -> Result<()> {
        let native = self.native_output_files();
        if let Some(missing) = native.iter().find(|path| !path.is_file()) {
            return Err(CalculatorError::NoOutput(missing.clone()));
        }
        let beam = self.beam()?;
        let mut geometry = Group::new();
        self.parameters
            .detector_geometry
            .geometry()?
            .write_s2e(&mut geometry)?;

        let directory = self.pattern_dir.clone();
        let storage = self.config.storage;
        let targets = native
            .par_iter()
            .enumerate()
            .map(|(index, path)| -> Result<PathBuf> {
                let root = self.normalize_pattern(path, &beam, &geometry)?;
                let target = directory.join(numbered_file_name(OUTPUT_PREFIX, index + 1));
                write_tree(&target, &root, storage)?;
                Ok(target)
            })
            .collect::<Result<Vec<PathBuf>>>()?;

        let info = S2eInfo::new(
            "Diffraction patterns simulated with pattern_sim (CrystFEL)",
            "External links to one s2e file per pattern",
        );
        let mut master = new_document(&info)?;
        for (index, target) in targets.iter().enumerate() {
            master.insert_link(&format!("data/{}", pattern_group_name(index + 1)), target, "/")?;
        }
        beam.write_s2e(master.ensure_group("params/beam")?)?;
        master.insert("params/geom", geometry)?;
        if let Some(input) = &self.input_path {
            if input.is_file() {
                link_parent(&mut master, input)?;
            }
        }
        validate_layout(&master)?;

        let master_path = directory.with_extension("h5");
        write_tree(&master_path, &master, storage)?;
        info!(
            "{} patterns indexed in {}",
            targets.len(),
            master_path.display()
        );
        self.output_path = master_path;
        Ok(())
    }

    fn to_dump(&self) -> CalculatorDump {
        CalculatorDump::PatternSim(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{DetectorGeometry, DetectorPanel};
    use crate::s2e::ContainerFormat;
    use crate::utils::{Energy, Length};
    use ndarray::Array2;
    use tempfile::{tempdir, TempDir};

    fn fixture() -> (TempDir, PatternSimParameters) {
        let dir = tempdir().unwrap();
        let sample = dir.path().join("2nip.pdb");
        fs::write(&sample, "END\n").unwrap();
        let panel =
            DetectorPanel::square(8, Length::from_meters(2.2e-4), Length::from_meters(0.13)).unwrap();
        let mut parameters =
            PatternSimParameters::new(&sample, DetectorGeometry::new(vec![panel]).unwrap());
        parameters.beam_parameters = Some(
            PhotonBeamParameters::new(
                Energy::from_electronvolts(4.96e3),
                1e-2,
                Energy::from_joules(2e-3),
            )
            .unwrap()
            .with_beam_diameter_fwhm(Length::from_meters(1e-7))
            .unwrap(),
        );
        (dir, parameters)
    }

    #[test]
    fn test_command_arguments() {
        let (dir, mut parameters) = fixture();
        parameters.powder = true;
        parameters.crystal_size_min = Some(Length::from_nanometers(100.0));
        parameters.crystal_size_max = Some(Length::from_nanometers(200.0));
        parameters.number_of_background_photons = 100;
        let diffractor =
            PatternSimPhotonDiffractor::new(parameters.clone(), None, Some(dir.path().join("diffr")))
                .unwrap();
        let beam = parameters.beam_parameters.clone().unwrap();
        let args = diffractor.command_arguments(&beam, Path::new("detector.geom"));

        assert_eq!(args[0], "-p");
        assert!(args.contains(&"--geometry=detector.geom".to_string()));
        assert!(args.contains(&"--number=1".to_string()));
        assert!(args.contains(&"--spectrum=sase".to_string()));
        assert!(args.contains(&"--random-orientation".to_string()));
        assert!(args.contains(&"--no-noise".to_string()));
        assert!(args.contains(&"--background=100".to_string()));
        assert!(args.iter().any(|a| a.starts_with("--min-size=")));
        assert!(args.iter().any(|a| a.starts_with("--max-size=")));
        assert!(args.iter().any(|a| a.starts_with("--beam-radius=")));
        assert!(args.iter().any(|a| a.starts_with("--powder=")));
        assert!(!args.contains(&"--gpu".to_string()));
        assert!(args
            .iter()
            .any(|a| a.ends_with(&numbered_file_name(OUTPUT_PREFIX, 1))));
    }

    #[test]
    fn test_native_output_names() {
        let (dir, mut parameters) = fixture();
        parameters.number_of_diffraction_patterns = 3;
        let diffractor =
            PatternSimPhotonDiffractor::new(parameters, None, Some(dir.path().join("diffr"))).unwrap();
        let names: Vec<String> = diffractor
            .native_output_files()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["diffr_out-1.h5", "diffr_out-2.h5", "diffr_out-3.h5"]);
    }

    #[test]
    fn test_beam_required() {
        let (_dir, mut parameters) = fixture();
        parameters.beam_parameters = None;
        assert!(matches!(
            PatternSimPhotonDiffractor::new(parameters, None, None),
            Err(CalculatorError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_beam_from_upstream_file() {
        let (dir, mut parameters) = fixture();
        let beam = parameters.beam_parameters.take().unwrap();
        let upstream = dir.path().join("pmi_out_0000001.h5");
        let mut root = new_document(&S2eInfo::new("m", "d")).unwrap();
        beam.write_s2e(root.ensure_group("params/beam").unwrap()).unwrap();
        write_tree(&upstream, &root, ContainerFormat::Json).unwrap();

        let diffractor =
            PatternSimPhotonDiffractor::new(parameters, Some(dir.path().to_path_buf()), None).unwrap();
        let found = diffractor.parameters().beam_parameters.clone().unwrap();
        assert_eq!(found.photon_energy_spectrum_type, beam.photon_energy_spectrum_type);
        assert!((found.photon_energy.electronvolts() - 4.96e3).abs() < 1e-6);
    }

    #[test]
    fn test_save_h5_writes_master() {
        let (dir, mut parameters) = fixture();
        parameters.number_of_diffraction_patterns = 2;
        let output = dir.path().join("diffr");
        let mut diffractor = PatternSimPhotonDiffractor::new(parameters, None, Some(output.clone()))
            .unwrap()
            .with_config(PlatformConfig {
                storage: ContainerFormat::Json,
                ..PlatformConfig::default()
            });

        fs::create_dir_all(&output).unwrap();
        for native in diffractor.native_output_files() {
            let mut pattern = Group::new();
            pattern
                .insert_float("data/data", Array2::<f64>::ones((8, 8)).into_dyn())
                .unwrap();
            write_tree(&native, &pattern, ContainerFormat::Json).unwrap();
        }
        diffractor.save_h5().unwrap();

        let master_path = dir.path().join("diffr.h5");
        assert_eq!(diffractor.output_path(), master_path.as_path());
        let master = read_tree(&master_path).unwrap();
        validate_layout(&master).unwrap();
        assert_eq!(master.group("data").unwrap().keys(), vec!["0000001", "0000002"]);
        assert!(master.contains("params/beam/photonEnergy"));
        assert!(master.contains("params/beam/focusArea"));

        let pattern = read_tree(&output.join("diffr_out_0000002.h5")).unwrap();
        assert_eq!(pattern.float_array("data/data").unwrap().shape(), &[8, 8]);
        assert!(pattern.contains("params/geom/detectorDist"));
    }

    #[test]
    fn test_save_h5_without_output() {
        let (dir, parameters) = fixture();
        let mut diffractor =
            PatternSimPhotonDiffractor::new(parameters, None, Some(dir.path().join("none"))).unwrap();
        assert!(matches!(diffractor.save_h5(), Err(CalculatorError::NoOutput(_))));
    }
}
