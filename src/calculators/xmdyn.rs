/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! XMDYN photon-matter interaction calculator
//!
//! Every trajectory runs in its own directory `<output>/xmdyn_run_<t:07>`
//! holding the rotated sample (`sample.xyz`), the run parameters
//! (`xparams.txt`) and XMDYN's snapshot tables (`snp/`). After a successful run
//! the snapshots are converted into `<output>/pmi_out_<t:07>.h5`.

use super::backengine::Backengine;
use super::dump::CalculatorDump;
use super::errors::{CalculatorError, Result};
use super::snapshot::{load_snapshot_from_dir, snapshot_dirs};
use super::Calculator;
use crate::config::PlatformConfig;
use crate::parameters::{IntoParameters, PhotonBeamParameters, PhotonMatterInteractorParameters};
use crate::s2e::{
    link_parent, new_document, numbered_file_name, read_tree, snapshot_group_name,
    validate_layout, write_tree, Group, S2eInfo,
};
use crate::sample::{Quaternion, Sample};
use crate::utils::{format_exponent, Energy, Length};
use log::{debug, info, warn};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT_PATH: &str = "prop";
pub const DEFAULT_OUTPUT_PATH: &str = "pmi";
pub const XPARAMS_FILE: &str = "xparams.txt";
pub const SAMPLE_FILE: &str = "sample.xyz";
const OUTPUT_PREFIX: &str = "pmi_out";

/// Where the interactor takes its beam from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PmiInput {
    /// A propagation output file, or a directory of them
    Propagation(PathBuf),
    /// An explicit beam, without upstream files
    Beam(PhotonBeamParameters),
    /// A finished XMDYN run directory to convert without running
    ExistingRun(PathBuf),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XmdynPhotonMatterInteractor {
    parameters: PhotonMatterInteractorParameters,
    input: PmiInput,
    output_path: PathBuf,
    #[serde(default)]
    sample_path: Option<PathBuf>,
    #[serde(default)]
    config: PlatformConfig,
    #[serde(default)]
    produced: Vec<PathBuf>,
}

impl XmdynPhotonMatterInteractor {
    /// Interactor reading its beam from propagation output (default `prop`)
    pub fn new<P>(
        parameters: P,
        input_path: Option<PathBuf>,
        output_path: Option<PathBuf>,
        sample_path: impl Into<PathBuf>,
    ) -> Result<Self>
    where
        P: IntoParameters<PhotonMatterInteractorParameters>,
    {
        let input = PmiInput::Propagation(
            input_path.unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_PATH)),
        );
        Self::build(parameters.into_parameters()?, input, output_path, sample_path.into())
    }

    /// Interactor driven by an explicit beam instead of upstream files
    pub fn with_beam<P>(
        parameters: P,
        beam: PhotonBeamParameters,
        output_path: Option<PathBuf>,
        sample_path: impl Into<PathBuf>,
    ) -> Result<Self>
    where
        P: IntoParameters<PhotonMatterInteractorParameters>,
    {
        beam.validate()?;
        Self::build(
            parameters.into_parameters()?,
            PmiInput::Beam(beam),
            output_path,
            sample_path.into(),
        )
    }

    /// Interactor converting an existing XMDYN run directory; `save_h5` writes
    /// the converted run to `output_path` itself
    pub fn load_from_path(run_dir: impl Into<PathBuf>, output_path: Option<PathBuf>) -> Result<Self> {
        let run_dir = run_dir.into();
        if !run_dir.is_dir() {
            return Err(CalculatorError::MissingInput(run_dir));
        }
        Ok(Self {
            parameters: PhotonMatterInteractorParameters::default(),
            input: PmiInput::ExistingRun(run_dir),
            output_path: output_path.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
            sample_path: None,
            config: PlatformConfig::default(),
            produced: Vec::new(),
        })
    }

    fn build(
        parameters: PhotonMatterInteractorParameters,
        input: PmiInput,
        output_path: Option<PathBuf>,
        sample_path: PathBuf,
    ) -> Result<Self> {
        if !sample_path.is_file() {
            return Err(CalculatorError::MissingInput(sample_path));
        }
        Ok(Self {
            parameters,
            input,
            output_path: output_path.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
            sample_path: Some(sample_path),
            config: PlatformConfig::default(),
            produced: Vec::new(),
        })
    }

    pub fn with_config(mut self, config: PlatformConfig) -> Self {
        self.config = config;
        self
    }

    pub fn parameters(&self) -> &PhotonMatterInteractorParameters {
        &self.parameters
    }

    pub fn input(&self) -> &PmiInput {
        &self.input
    }

    pub fn sample_path(&self) -> Option<&Path> {
        self.sample_path.as_deref()
    }

    /// Files written by the last `backengine` run
    pub fn produced_files(&self) -> &[PathBuf] {
        &self.produced
    }

    /// Upstream files a trajectory may take its beam from, in name order
    fn propagation_files(path: &Path) -> Result<Vec<PathBuf>> {
        if path.is_file() {
            return Ok(vec![path.to_path_buf()]);
        }
        if !path.is_dir() {
            return Err(CalculatorError::MissingInput(path.to_path_buf()));
        }
        let mut files: Vec<PathBuf> = fs::read_dir(path)
            .map_err(|e| CalculatorError::io(path, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().map(|ext| ext == "h5").unwrap_or(false))
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(CalculatorError::InvalidInput(format!(
                "no .h5 files in {}",
                path.display()
            )));
        }
        Ok(files)
    }

    fn run_trajectory(
        &self,
        trajectory: usize,
        sample: &Sample,
        beam: &PhotonBeamParameters,
        rotation: Quaternion,
        parent: Option<&Path>,
    ) -> Result<i32> {
        let run_dir = self
            .output_path
            .join(format!("xmdyn_run_{:07}", trajectory));
        fs::create_dir_all(&run_dir).map_err(|e| CalculatorError::io(&run_dir, e))?;
        let snapshots = run_dir.join("snp");
        if snapshots.exists() {
            fs::remove_dir_all(&snapshots).map_err(|e| CalculatorError::io(&snapshots, e))?;
        }

        sample.rotated(&rotation).write_xyz(&run_dir.join(SAMPLE_FILE))?;
        let seed = self
            .parameters
            .random_seed
            .map(|seed| seed.wrapping_add(trajectory as u64));
        let xparams = XmdynRunParameters::new(&self.parameters, beam, rotation, seed);
        let xparams_path = run_dir.join(XPARAMS_FILE);
        fs::write(&xparams_path, xparams.to_text())
            .map_err(|e| CalculatorError::io(&xparams_path, e))?;

        let (env_key, env_value) = self.parameters.common.thread_env();
        let output = Backengine::new(&self.config.executables.xmdyn)
            .prefix(
                self.parameters
                    .common
                    .mpi_prefix(&self.config.mpi_launcher, 1),
            )
            .arg(XPARAMS_FILE)
            .current_dir(&run_dir)
            .env(env_key, env_value)
            .run()?;
        if !output.success() {
            return Ok(output.status);
        }

        let root = convert_xmdyn_run(&run_dir, &self.parameters, parent)?;
        let target = self
            .output_path
            .join(numbered_file_name(OUTPUT_PREFIX, trajectory));
        write_tree(&target, &root, self.config.storage)?;
        info!("Trajectory {} written to {}", trajectory, target.display());
        Ok(0)
    }
}

impl Calculator for XmdynPhotonMatterInteractor {
    fn name(&self) -> &'static str {
        "xmdyn"
    }

    fn input_path(&self) -> Option<&Path> {
        match &self.input {
            PmiInput::Propagation(path) | PmiInput::ExistingRun(path) => Some(path),
            PmiInput::Beam(_) => None,
        }
    }

    fn set_input_path(&mut self, path: PathBuf) {
        self.input = PmiInput::Propagation(path);
    }

    fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn backengine(&mut self) -> Result<i32> {
        if let PmiInput::ExistingRun(dir) = &self.input {
            info!("Using existing XMDYN run in {}", dir.display());
            return Ok(0);
        }
        let sample_path = self
            .sample_path
            .clone()
            .ok_or_else(|| CalculatorError::InvalidInput("no sample given".to_string()))?;
        let sample = Sample::from_file(&sample_path)?;
        fs::create_dir_all(&self.output_path)
            .map_err(|e| CalculatorError::io(&self.output_path, e))?;

        let beam_known =
            matches!(self.input, PmiInput::Beam(_)) || self.parameters.beam_parameters.is_some();
        let upstream = match &self.input {
            // with a known beam the propagation files only provide history links
            PmiInput::Propagation(path) if beam_known => {
                Self::propagation_files(path).unwrap_or_else(|e| {
                    debug!("No history parents: {}", e);
                    Vec::new()
                })
            }
            PmiInput::Propagation(path) => Self::propagation_files(path)?,
            _ => Vec::new(),
        };
        let mut rng = match self.parameters.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let fixed_rotation = self.parameters.quaternion()?;

        self.produced.clear();
        for trajectory in 1..=self.parameters.number_of_trajectories {
            let parent = upstream.get((trajectory - 1) % upstream.len().max(1));
            let beam = match (&self.input, &self.parameters.beam_parameters, parent) {
                (PmiInput::Beam(beam), _, _) => beam.clone(),
                (_, Some(beam), _) => beam.clone(),
                (_, None, Some(parent)) => PhotonBeamParameters::from_s2e(&read_tree(parent)?)?,
                (_, None, None) => {
                    return Err(CalculatorError::InvalidInput(
                        "no beam parameters and no propagation input".to_string(),
                    ))
                }
            };
            let rotation = if self.parameters.random_rotation {
                Quaternion::random(&mut rng)
            } else {
                fixed_rotation
            };
            debug!(
                "Trajectory {}: rotation {:?}, {:.3e} photons",
                trajectory,
                rotation.to_array(),
                beam.number_of_photons()
            );

            let status =
                self.run_trajectory(trajectory, &sample, &beam, rotation, parent.map(PathBuf::as_path))?;
            if status != 0 {
                warn!("XMDYN trajectory {} failed with status {}", trajectory, status);
                return Ok(status);
            }
            self.produced.push(
                self.output_path
                    .join(numbered_file_name(OUTPUT_PREFIX, trajectory)),
            );
        }
        Ok(0)
    }

    fn save_h5(&mut self) -> Result<()> {
        if let PmiInput::ExistingRun(dir) = &self.input {
            let root = convert_xmdyn_run(dir, &self.parameters, None)?;
            write_tree(&self.output_path, &root, self.config.storage)?;
            info!("Converted {} into {}", dir.display(), self.output_path.display());
            return Ok(());
        }

        if self.produced.is_empty() {
            return Err(CalculatorError::NoOutput(self.output_path.clone()));
        }
        self.produced
            .par_iter()
            .try_for_each(|path| -> Result<()> {
                validate_layout(&read_tree(path)?)?;
                Ok(())
            })?;
        info!(
            "{} PMI files in {} follow the s2e layout",
            self.produced.len(),
            self.output_path.display()
        );
        Ok(())
    }

    fn to_dump(&self) -> CalculatorDump {
        CalculatorDump::Xmdyn(self.clone())
    }
}

/// Contents of `xparams.txt`, one `KEY value...` pair per line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmdynRunParameters {
    entries: BTreeMap<String, Vec<String>>,
}

impl XmdynRunParameters {
    fn new(
        parameters: &PhotonMatterInteractorParameters,
        beam: &PhotonBeamParameters,
        rotation: Quaternion,
        seed: Option<u64>,
    ) -> Self {
        let number = |value: f64| format_exponent(value, 9, false);
        let mut run = Self::default();
        run.set("NUMBER_OF_STEPS", vec![parameters.number_of_steps.to_string()]);
        run.set("PHOTON_ENERGY_EV", vec![number(beam.photon_energy.electronvolts())]);
        run.set("PULSE_ENERGY_J", vec![number(beam.pulse_energy.joules())]);
        run.set(
            "RELATIVE_BANDWIDTH",
            vec![number(beam.photon_energy_relative_bandwidth)],
        );
        run.set("NUMBER_OF_PHOTONS", vec![number(beam.number_of_photons())]);
        if let Some(fwhm) = beam.beam_diameter_fwhm {
            run.set("BEAM_FWHM_M", vec![number(fwhm.meters())]);
        }
        run.set("SAMPLE_FILE", vec![SAMPLE_FILE.to_string()]);
        if let Some(seed) = seed {
            run.set("RANDOM_SEED", vec![seed.to_string()]);
        }
        run.set(
            "CALCULATE_COMPTON",
            vec![(parameters.calculate_compton as u8).to_string()],
        );
        run.set(
            "ROTATION",
            rotation.to_array().iter().map(|&c| number(c)).collect(),
        );
        run
    }

    fn set(&mut self, key: &str, values: Vec<String>) {
        self.entries.insert(key.to_string(), values);
    }

    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for (key, values) in &self.entries {
            // writing to a String cannot fail
            let _ = writeln!(text, "{} {}", key, values.join(" "));
        }
        text
    }

    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default())
            .filter_map(|line| {
                let mut words = line.split_whitespace();
                let key = words.next()?;
                Some((key.to_string(), words.map(str::to_string).collect()))
            })
            .collect();
        Self { entries }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CalculatorError::io(path, e))?;
        Ok(Self::parse(&text))
    }

    pub fn numbers(&self, key: &str) -> Option<Vec<f64>> {
        self.entries
            .get(key)?
            .iter()
            .map(|word| word.parse::<f64>().ok())
            .collect()
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.numbers(key)?.as_slice() {
            [value] => Some(*value),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.number(key).map(|value| value != 0.0)
    }

    pub fn rotation(&self) -> Option<[f64; 4]> {
        self.numbers("ROTATION")?.try_into().ok()
    }

    /// Beam recorded for the run, if complete
    pub fn beam(&self) -> Option<PhotonBeamParameters> {
        let photon_energy = self.number("PHOTON_ENERGY_EV")?;
        let pulse_energy = self.number("PULSE_ENERGY_J")?;
        let bandwidth = self
            .number("RELATIVE_BANDWIDTH")
            .unwrap_or(crate::parameters::DEFAULT_RELATIVE_BANDWIDTH);
        let beam = PhotonBeamParameters::new(
            Energy::from_electronvolts(photon_energy),
            bandwidth,
            Energy::from_joules(pulse_energy),
        )
        .ok()?;
        match self.number("BEAM_FWHM_M") {
            Some(fwhm) => beam.with_beam_diameter_fwhm(Length::from_meters(fwhm)).ok(),
            None => Some(beam),
        }
    }
}

/// Convert an XMDYN run directory into an s2e PMI document.
///
/// Values recorded in the run's `xparams.txt` take precedence over
/// `parameters`. Snapshots are loaded and converted in parallel.
pub fn convert_xmdyn_run(
    run_dir: &Path,
    parameters: &PhotonMatterInteractorParameters,
    parent: Option<&Path>,
) -> Result<Group> {
    let xparams_path = run_dir.join(XPARAMS_FILE);
    let xparams = if xparams_path.is_file() {
        XmdynRunParameters::read(&xparams_path)?
    } else {
        debug!("No {} in {}", XPARAMS_FILE, run_dir.display());
        XmdynRunParameters::default()
    };

    let dirs = snapshot_dirs(run_dir)?;
    if dirs.is_empty() {
        return Err(CalculatorError::NoOutput(run_dir.to_path_buf()));
    }

    let compton = xparams
        .flag("CALCULATE_COMPTON")
        .unwrap_or(parameters.calculate_compton);
    let beam = xparams.beam().or_else(|| parameters.beam_parameters.clone());
    let nph = match xparams
        .number("NUMBER_OF_PHOTONS")
        .or_else(|| beam.as_ref().map(PhotonBeamParameters::number_of_photons))
    {
        Some(nph) => nph,
        None => {
            warn!("No photon number known for {}, writing Nph = 0", run_dir.display());
            0.0
        }
    };
    let rotation = xparams.rotation().unwrap_or(parameters.rotation);
    let angle = match Quaternion::from_array(rotation) {
        Ok(q) if !q.is_identity() => rotation,
        _ => [0.0; 4],
    };

    let groups = dirs
        .par_iter()
        .map(|dir| load_snapshot_from_dir(dir)?.to_s2e(nph, compton))
        .collect::<Result<Vec<Group>>>()?;

    let info = S2eInfo::new(
        "Photon-matter interaction simulated with XMDYN (molecular dynamics with Monte Carlo ionization)",
        "Atomic positions, atom types, form factors and ionization per snapshot",
    );
    let mut root = new_document(&info)?;
    for (index, group) in groups.into_iter().enumerate() {
        root.insert(&format!("data/{}", snapshot_group_name(index + 1)), group)?;
    }
    let angle = Array2::from_shape_vec((1, 4), angle.to_vec())
        .map_err(|e| CalculatorError::InvalidInput(e.to_string()))?;
    root.insert_float("data/angle", angle.into_dyn())?;

    if let Some(beam) = &beam {
        beam.write_s2e(root.ensure_group("params/beam")?)?;
    }
    parameters.write_s2e(root.ensure_group("params/pmi")?)?;
    if let Some(parent) = parent {
        link_parent(&mut root, parent)?;
    }
    debug!(
        "Converted {} snapshots from {}",
        dirs.len(),
        run_dir.display()
    );
    Ok(root)
}
