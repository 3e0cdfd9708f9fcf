use serde::{Serialize, Deserialize};

use crate::eval::EvaluationResult;

/// Per-epoch training statistics sent on `TrainingConfig::progress_tx`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    pub max_epochs: usize,
    /// Mean absolute error over this epoch's batch.
    pub error: f64,
    /// Test-set score, when per-epoch evaluation is enabled.
    pub evaluation: Option<EvaluationResult>,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
