//! Pipe-separated CSV logs of training runs.
//!
//! Format:
//! - first line `sep=|` so spreadsheet tools pick the separator up
//! - header `epoch|evaluation_0|error_0[|evaluation_1|error_1...]`
//! - one row per epoch, epochs numbered from 1; evaluation is the test accuracy percentage,
//!   `0` when it was not recorded

use std::path::Path;

use crate::error::Result;
use crate::train::TrainingResult;

/// Log of a single run.
pub fn training_log(result: &TrainingResult) -> String {
    experiment_log(std::slice::from_ref(result))
}

/// Side-by-side log of repeated runs; rows stop at the shortest run.
pub fn experiment_log(results: &[TrainingResult]) -> String {
    let mut out = String::from("sep=|\nepoch");
    for i in 0..results.len() {
        out.push_str(&format!("|evaluation_{i}|error_{i}"));
    }
    out.push('\n');

    let epochs = results.iter().map(|r| r.epoch_errors.len()).min().unwrap_or(0);
    for epoch in 0..epochs {
        out.push_str(&(epoch + 1).to_string());
        for result in results {
            let evaluation = result.evaluations.get(epoch).map_or(0.0, |e| e.percentage());
            out.push_str(&format!("|{}|{}", evaluation, result.epoch_errors[epoch]));
        }
        out.push('\n');
    }
    out
}

/// Writes a log, creating the parent directory if needed.
pub fn write_log<P: AsRef<Path>>(path: P, contents: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::eval::EvaluationResult;
    use crate::network::{Network, OutputMode};
    use crate::train::TrainerState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn result(errors: Vec<f64>, evaluations: Vec<EvaluationResult>) -> TrainingResult {
        let mut rng = StdRng::seed_from_u64(0);
        TrainingResult {
            network: Network::new(ActivationFunction::Sigmoid, 0.5, &[2, 2], OutputMode::Classifier, &mut rng).unwrap(),
            epochs: errors.len(),
            epoch_errors: errors,
            evaluations,
            state: TrainerState::MaxEpochsReached,
        }
    }

    #[test]
    fn single_run_log() {
        let r = result(
            vec![0.5, 0.25],
            vec![EvaluationResult { correct: 1, total: 4 }, EvaluationResult { correct: 3, total: 4 }],
        );
        assert_eq!(training_log(&r), "sep=|\nepoch|evaluation_0|error_0\n1|25|0.5\n2|75|0.25\n");
    }

    #[test]
    fn missing_evaluations_are_zero_and_rows_stop_at_shortest_run() {
        let a = result(vec![1.0, 0.5, 0.25], vec![]);
        let b = result(vec![2.0, 1.5], vec![]);
        let log = experiment_log(&[a, b]);
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines[1], "epoch|evaluation_0|error_0|evaluation_1|error_1");
        assert_eq!(lines[2], "1|0|1|0|2");
        assert_eq!(lines.len(), 4);
    }
}
