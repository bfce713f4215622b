/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Command-line interface
//!
//! `simex-rs <command>` runs one pipeline stage, a conversion or a dumped
//! calculator. The returned code is the backengine's exit status.

mod commands;

use crate::calculators::CalculatorError;
use crate::config::{ConfigError, PlatformConfig};
use crate::converters::ConverterError;
use crate::parameters::ParametersError;
use crate::s2e::S2eError;
use clap::Parser;
use std::path::PathBuf;

/// Parse `args` (without the program name) and run the selected command
pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("simex-rs".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();

    match Cli::try_parse_from(&full_args) {
        Ok(cli) => {
            let config = PlatformConfig::load(cli.config.as_deref())?;
            dispatch(cli.command, &config)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "simex-rs",
    version,
    about = "Start-to-end XFEL simulation stages"
)]
struct Cli {
    /// Platform configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Run the XMDYN photon-matter interaction
    Pmi(commands::PmiArgs),
    /// Convert an existing XMDYN run directory into an s2e file
    ConvertXmdyn(commands::ConvertXmdynArgs),
    /// Simulate diffraction patterns with pattern_sim
    Diffract(commands::DiffractArgs),
    /// Convert openPMD particle output into a genesis distribution file
    Pic2genesis(commands::Pic2GenesisArgs),
    /// Print the tree of an s2e file and check its layout
    Inspect(commands::InspectArgs),
    /// Run a dumped calculator
    Run(commands::RunArgs),
}

fn dispatch(command: CliCommand, config: &PlatformConfig) -> Result<i32, CliError> {
    match command {
        CliCommand::Pmi(args) => commands::run_pmi_command(args, config),
        CliCommand::ConvertXmdyn(args) => commands::run_convert_xmdyn_command(args, config),
        CliCommand::Diffract(args) => commands::run_diffract_command(args, config),
        CliCommand::Pic2genesis(args) => commands::run_pic2genesis_command(args),
        CliCommand::Inspect(args) => commands::run_inspect_command(args),
        CliCommand::Run(args) => commands::run_dump_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parameters(#[from] ParametersError),

    #[error(transparent)]
    Calculator(#[from] CalculatorError),

    #[error(transparent)]
    Converter(#[from] ConverterError),

    #[error(transparent)]
    S2e(#[from] S2eError),
}
