use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::activation::ActivationFunction;
use crate::error::Result;
use crate::network::OutputMode;
use crate::train::{ReconstructionLog, TrainingConfig};

/// Everything needed to train on bitmap directories: architecture, hyperparameters, dataset
/// locations and preprocessing flags.
///
/// Kept serializable so a run can be described in (or dumped to) a JSON file. Missing fields
/// take the values of [`TrainOptions::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainOptions {
    pub learning_rate: f64,
    pub momentum: f64,
    pub error_threshold: f64,
    /// Layer sizes, input first.
    pub sizes: Vec<usize>,
    pub training_path: PathBuf,
    /// Scored once after training when set.
    pub validation_path: Option<PathBuf>,
    pub test_path: PathBuf,
    pub max_epochs: usize,
    pub verbose: bool,
    pub batch_size: usize,
    pub activation: ActivationFunction,
    pub initial_weights_range: f64,
    pub evaluate_each_epoch: bool,
    pub normalize_input: bool,
    pub encoder: bool,
    /// Seed for weight initialization and batch sampling; entropy when absent.
    pub seed: Option<u64>,
    /// Encoder runs write reconstruction snapshots of one training sample here.
    pub reconstruction_dir: Option<PathBuf>,
}

impl Default for TrainOptions {
    fn default() -> Self {
        TrainOptions {
            learning_rate: 0.5,
            momentum: 0.9,
            error_threshold: 0.0,
            sizes: vec![70, 200, 10],
            training_path: PathBuf::from("../TrainingData"),
            validation_path: None,
            test_path: PathBuf::from("../TestData"),
            max_epochs: 200,
            verbose: false,
            batch_size: 20,
            activation: ActivationFunction::Sigmoid,
            initial_weights_range: 0.5,
            evaluate_each_epoch: false,
            normalize_input: false,
            encoder: false,
            seed: None,
            reconstruction_dir: None,
        }
    }
}

impl TrainOptions {
    pub fn output_mode(&self) -> OutputMode {
        if self.encoder {
            OutputMode::Reconstruction
        } else {
            OutputMode::Classifier
        }
    }

    /// The core hyperparameters, without progress channel or stop flag.
    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            error_threshold: self.error_threshold,
            reconstruction: self.reconstruction_dir.as_ref().map(ReconstructionLog::new),
            encoder: self.encoder,
            evaluate_each_epoch: self.evaluate_each_epoch,
            verbose: self.verbose,
            ..TrainingConfig::new(self.learning_rate, self.momentum, self.max_epochs, self.batch_size)
        }
    }

    /// Options for a run whose per-epoch log is dumped: classifiers are then scored on the
    /// test set after every epoch so the log carries accuracies.
    pub fn with_training_log(mut self) -> TrainOptions {
        if !self.encoder {
            self.evaluate_each_epoch = true;
        }
        self
    }

    /// Serializes the options to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes options from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<TrainOptions> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
