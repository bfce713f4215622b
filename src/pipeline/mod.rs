/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Sequential start-to-end pipelines
//!
//! Stages run in order; each stage reads the previous stage's output.

pub mod errors;

pub use errors::{PipelineError, Result};

use crate::calculators::Calculator;
use log::info;
use std::path::PathBuf;

#[derive(Default)]
pub struct ExperimentPipeline {
    stages: Vec<Box<dyn Calculator>>,
}

impl ExperimentPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(mut self, stage: impl Calculator + 'static) -> Self {
        self.push(Box::new(stage));
        self
    }

    pub fn push(&mut self, stage: Box<dyn Calculator>) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run every stage, returning the output path of the last one
    pub fn run(&mut self) -> Result<PathBuf> {
        if self.stages.is_empty() {
            return Err(PipelineError::Empty);
        }
        let total = self.stages.len();
        let mut previous: Option<PathBuf> = None;

        for (index, stage) in self.stages.iter_mut().enumerate() {
            let name = stage.name();
            if let Some(input) = previous.take() {
                stage.set_input_path(input);
            }
            info!("Stage {}/{}: {}", index + 1, total, name);

            let wrap = |source| PipelineError::Calculator { index, name, source };
            let status = stage.backengine().map_err(wrap)?;
            if status != 0 {
                return Err(PipelineError::StageFailed { index, name, status });
            }
            stage.save_h5().map_err(wrap)?;
            previous = Some(stage.output_path().to_path_buf());
        }
        previous.ok_or(PipelineError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculators::{CalculatorDump, CalculatorError};
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    /// Records the input it was given and returns a fixed status
    struct Stage {
        name: &'static str,
        input: Option<PathBuf>,
        output: PathBuf,
        status: i32,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Stage {
        fn new(name: &'static str, output: &str, status: i32, log: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                input: None,
                output: PathBuf::from(output),
                status,
                log: Arc::clone(log),
            }
        }
    }

    impl Calculator for Stage {
        fn name(&self) -> &'static str {
            self.name
        }
        fn input_path(&self) -> Option<&Path> {
            self.input.as_deref()
        }
        fn set_input_path(&mut self, path: PathBuf) {
            self.input = Some(path);
        }
        fn output_path(&self) -> &Path {
            &self.output
        }
        fn backengine(&mut self) -> std::result::Result<i32, CalculatorError> {
            let input = self
                .input
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            self.log
                .lock()
                .unwrap()
                .push(format!("{} <- {}", self.name, input));
            Ok(self.status)
        }
        fn save_h5(&mut self) -> std::result::Result<(), CalculatorError> {
            self.log.lock().unwrap().push(format!("{} saved", self.name));
            Ok(())
        }
        fn to_dump(&self) -> CalculatorDump {
            unimplemented!("test stage cannot be dumped")
        }
    }

    #[test]
    fn test_chains_outputs_into_inputs() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = ExperimentPipeline::new()
            .with_stage(Stage::new("pmi", "pmi", 0, &log))
            .with_stage(Stage::new("diffr", "diffr.h5", 0, &log));
        assert_eq!(pipeline.stage_names(), vec!["pmi", "diffr"]);

        let output = pipeline.run().unwrap();
        assert_eq!(output, PathBuf::from("diffr.h5"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["pmi <- ", "pmi saved", "diffr <- pmi", "diffr saved"]
        );
    }

    #[test]
    fn test_stops_on_failed_stage() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = ExperimentPipeline::new()
            .with_stage(Stage::new("pmi", "pmi", 3, &log))
            .with_stage(Stage::new("diffr", "diffr", 0, &log));

        let err = pipeline.run().unwrap_err();
        assert!(matches!(
            err,
            PipelineError::StageFailed { index: 0, name: "pmi", status: 3 }
        ));
        assert_eq!(*log.lock().unwrap(), vec!["pmi <- "]);
    }

    #[test]
    fn test_empty_pipeline() {
        assert!(matches!(ExperimentPipeline::new().run(), Err(PipelineError::Empty)));
    }
}
