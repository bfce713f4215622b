/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Launching external simulation programs

use super::errors::{CalculatorError, Result};
use log::{debug, info, warn};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Lines of stderr repeated in the log when a backengine fails
const STDERR_TAIL_LINES: usize = 20;

/// Command line of a backengine run
#[derive(Debug, Clone, Default)]
pub struct Backengine {
    program: PathBuf,
    args: Vec<OsString>,
    prefix: Vec<String>,
    working_dir: Option<PathBuf>,
    env: Vec<(String, String)>,
}

/// Exit status and captured output of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackengineOutput {
    /// Exit code; `-1` when the process was killed by a signal
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl BackengineOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

impl Backengine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Launcher words placed before the program, e.g. `mpirun -np 4`
    pub fn prefix(mut self, prefix: Vec<String>) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The full command line, for logs
    pub fn command_line(&self) -> String {
        self.prefix
            .iter()
            .cloned()
            .chain(std::iter::once(self.program.display().to_string()))
            .chain(self.args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build(&self) -> Command {
        let mut command = match self.prefix.split_first() {
            Some((launcher, launcher_args)) => {
                let mut command = Command::new(launcher);
                command.args(launcher_args).arg(&self.program);
                command
            }
            None => Command::new(&self.program),
        };
        command.args(&self.args);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command
    }

    /// Run to completion, capturing stdout and stderr.
    ///
    /// A non-zero exit is not an error here; callers report it as the
    /// calculator status.
    pub fn run(&self) -> Result<BackengineOutput> {
        let command_line = self.command_line();
        info!("Running backengine: {}", command_line);
        if let Some(dir) = &self.working_dir {
            debug!("Working directory: {}", dir.display());
        }

        let output = self.build().output().map_err(|source| {
            let program = self
                .prefix
                .first()
                .cloned()
                .unwrap_or_else(|| self.program.display().to_string());
            if source.kind() == ErrorKind::NotFound {
                CalculatorError::ExecutableNotFound(program)
            } else {
                CalculatorError::Launch { program, source }
            }
        })?;

        let result = BackengineOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !result.stdout.is_empty() {
            debug!("{} stdout:\n{}", self.program.display(), result.stdout.trim_end());
        }

        if result.success() {
            info!("Backengine finished: {}", self.program.display());
        } else {
            let lines: Vec<&str> = result.stderr.lines().collect();
            let tail = &lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..];
            warn!(
                "Backengine {} exited with status {}\n{}",
                self.program.display(),
                result.status,
                tail.join("\n")
            );
        }
        Ok(result)
    }
}
