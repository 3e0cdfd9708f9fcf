use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use crate::error::{Error, Result};
use crate::train::epoch_stats::EpochStats;
use crate::train::reconstruction::ReconstructionLog;

/// Hyperparameters of one training run.
///
/// # Fields
/// - `learning_rate`      — step size, > 0
/// - `momentum`           — fraction of the previous update carried over, in `[0, 1)`
/// - `error_threshold`    — stop once the mean batch error is at or below this; `0` never stops
///                          early
/// - `max_epochs`         — hard upper bound on epochs, > 0
/// - `batch_size`         — samples drawn per epoch; clamped to the training-set size
/// - `encoder`            — train an autoencoder (targets are the inputs)
/// - `evaluate_each_epoch`— score the test set after every epoch
/// - `verbose`            — log every epoch at `info` instead of `debug`
/// - `progress_tx`        — optional channel receiving one `EpochStats` per epoch; a dropped
///                          receiver stops training after the current epoch
/// - `stop_flag`          — optional flag checked between epochs
/// - `reconstruction`     — encoder only: where to write snapshots of one sample's
///                          reconstruction
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub momentum: f64,
    pub error_threshold: f64,
    pub max_epochs: usize,
    pub batch_size: usize,
    pub encoder: bool,
    pub evaluate_each_epoch: bool,
    pub verbose: bool,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
    pub reconstruction: Option<ReconstructionLog>,
}

impl TrainingConfig {
    /// A classifier config with no early stopping, no per-epoch evaluation, no progress
    /// channel and no stop flag.
    pub fn new(learning_rate: f64, momentum: f64, max_epochs: usize, batch_size: usize) -> Self {
        TrainingConfig {
            learning_rate,
            momentum,
            error_threshold: 0.0,
            max_epochs,
            batch_size,
            encoder: false,
            evaluate_each_epoch: false,
            verbose: false,
            progress_tx: None,
            stop_flag: None,
            reconstruction: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "learning rate must be positive, got {}", self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(Error::InvalidConfiguration(format!(
                "momentum must be in [0, 1), got {}", self.momentum
            )));
        }
        if !(self.error_threshold >= 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "error threshold must be >= 0, got {}", self.error_threshold
            )));
        }
        if self.max_epochs == 0 {
            return Err(Error::InvalidConfiguration("max epochs must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfiguration("batch size must be at least 1".into()));
        }
        Ok(())
    }
}
