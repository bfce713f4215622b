/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

use super::CliError;
use crate::calculators::{
    dump_to_file, run_from_file, Calculator, PatternSimPhotonDiffractor,
    XmdynPhotonMatterInteractor,
};
use crate::config::PlatformConfig;
use crate::converters::convert_pic_to_genesis;
use crate::parameters::PhotonBeamParameters;
use crate::s2e::{read_tree, validate_layout, DatasetValue, Group, Node};
use crate::utils::Energy;
use log::info;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(clap::Args)]
pub(super) struct PmiArgs {
    /// Sample file (.pdb or s2e sample)
    #[arg(long)]
    sample: PathBuf,

    /// Interaction parameters (JSON)
    #[arg(long)]
    parameters: Option<PathBuf>,

    /// Propagation output file or directory
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(long)]
    output: Option<PathBuf>,

    /// Photon energy in eV; with --pulse-energy replaces the propagation input
    #[arg(long, requires = "pulse_energy")]
    photon_energy: Option<f64>,

    /// Pulse energy in J
    #[arg(long, requires = "photon_energy")]
    pulse_energy: Option<f64>,

    /// Relative bandwidth of the beam given on the command line
    #[arg(long, default_value_t = crate::parameters::DEFAULT_RELATIVE_BANDWIDTH)]
    bandwidth: f64,

    /// Write the configured calculator to this file instead of running it
    #[arg(long)]
    dump: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct ConvertXmdynArgs {
    /// XMDYN run directory (holding snp/)
    run_dir: PathBuf,

    /// Output s2e file
    #[arg(long, default_value = "pmi_out.h5")]
    output: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct DiffractArgs {
    /// Diffractor parameters (JSON)
    #[arg(long)]
    parameters: PathBuf,

    /// Upstream s2e file or directory providing the beam
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write the configured calculator to this file instead of running it
    #[arg(long)]
    dump: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct Pic2GenesisArgs {
    /// openPMD file
    input: PathBuf,

    /// Genesis distribution file
    #[arg(long, default_value = "beam.dist")]
    output: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct InspectArgs {
    /// s2e file
    file: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct RunArgs {
    /// Calculator dump written with --dump
    dump: PathBuf,
}

fn read_json(path: &Path) -> Result<Value, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Dump the calculator when asked to, run it otherwise
fn execute(calculator: &mut dyn Calculator, dump: Option<&Path>) -> Result<i32, CliError> {
    if let Some(path) = dump {
        dump_to_file(calculator, path)?;
        return Ok(0);
    }
    let status = calculator.backengine()?;
    if status != 0 {
        return Ok(status);
    }
    calculator.save_h5()?;
    info!("{} finished, output in {}", calculator.name(), calculator.output_path().display());
    Ok(0)
}

pub(super) fn run_pmi_command(args: PmiArgs, config: &PlatformConfig) -> Result<i32, CliError> {
    let parameters = match &args.parameters {
        Some(path) => read_json(path)?,
        None => Value::Object(Default::default()),
    };

    let pmi = match (args.photon_energy, args.pulse_energy) {
        (Some(photon_energy), Some(pulse_energy)) => {
            let beam = PhotonBeamParameters::new(
                Energy::from_electronvolts(photon_energy),
                args.bandwidth,
                Energy::from_joules(pulse_energy),
            )?;
            XmdynPhotonMatterInteractor::with_beam(parameters, beam, args.output, &args.sample)?
        }
        _ => XmdynPhotonMatterInteractor::new(parameters, args.input, args.output, &args.sample)?,
    };
    let mut pmi = pmi.with_config(config.clone());
    execute(&mut pmi, args.dump.as_deref())
}

pub(super) fn run_convert_xmdyn_command(
    args: ConvertXmdynArgs,
    config: &PlatformConfig,
) -> Result<i32, CliError> {
    let mut pmi = XmdynPhotonMatterInteractor::load_from_path(args.run_dir, Some(args.output))?
        .with_config(config.clone());
    execute(&mut pmi, None)
}

pub(super) fn run_diffract_command(args: DiffractArgs, config: &PlatformConfig) -> Result<i32, CliError> {
    let parameters = read_json(&args.parameters)?;
    let mut diffractor = PatternSimPhotonDiffractor::new(parameters, args.input, args.output)?
        .with_config(config.clone());
    execute(&mut diffractor, args.dump.as_deref())
}

pub(super) fn run_pic2genesis_command(args: Pic2GenesisArgs) -> Result<i32, CliError> {
    convert_pic_to_genesis(&args.input, &args.output)?;
    Ok(0)
}

pub(super) fn run_inspect_command(args: InspectArgs) -> Result<i32, CliError> {
    let root = read_tree(&args.file)?;
    for line in describe_tree(&root) {
        println!("{}", line);
    }
    match validate_layout(&root) {
        Ok(()) => Ok(0),
        Err(e) => {
            eprintln!("{}: {}", args.file.display(), e);
            Ok(1)
        }
    }
}

pub(super) fn run_dump_command(args: RunArgs) -> Result<i32, CliError> {
    Ok(run_from_file(&args.dump)?)
}

/// One line per member: groups end in `/`, datasets show their shape
pub(super) fn describe_tree(root: &Group) -> Vec<String> {
    fn walk(group: &Group, prefix: &str, lines: &mut Vec<String>) {
        for (name, node) in group.members() {
            let path = format!("{}/{}", prefix, name);
            match node {
                Node::Group(child) => {
                    lines.push(format!("{}/", path));
                    walk(child, &path, lines);
                }
                Node::Dataset(dataset) => match &dataset.value {
                    DatasetValue::Text(text) => lines.push(format!("{} = {:?}", path, text)),
                    _ => lines.push(format!("{} {:?}", path, dataset.shape())),
                },
                Node::ExternalLink(link) => {
                    lines.push(format!("{} -> {}:{}", path, link.file.display(), link.path))
                }
            }
        }
    }
    let mut lines = Vec::new();
    walk(root, "", &mut lines);
    lines
}
