use crate::eval::EvaluationResult;
use crate::network::Network;
use crate::train::trainer::TrainerState;

/// Outcome of a training run.
#[derive(Debug, Clone)]
pub struct TrainingResult {
    /// The trained network.
    pub network: Network,
    /// Epochs actually run.
    pub epochs: usize,
    /// Mean absolute batch error, one entry per epoch.
    pub epoch_errors: Vec<f64>,
    /// Test-set score per epoch; empty unless per-epoch evaluation was enabled.
    pub evaluations: Vec<EvaluationResult>,
    /// How the run ended.
    pub state: TrainerState,
}

impl TrainingResult {
    pub fn final_error(&self) -> Option<f64> {
        self.epoch_errors.last().copied()
    }
}
