use serde::{Serialize, Deserialize};

use crate::data::Sample;
use crate::error::{Error, Result};
use crate::network::Network;

/// Classification score of a network over a labeled dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub correct: usize,
    pub total: usize,
}

impl EvaluationResult {
    pub fn incorrect(&self) -> usize {
        self.total - self.correct
    }

    /// `correct / total * 100`, rounded to two decimals. Zero for an empty result.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.correct as f64 / self.total as f64 * 100.0 * 100.0).round() / 100.0
    }
}

/// Classifies every sample and counts exact label matches.
///
/// Fails with `InvalidArgument` on an empty dataset, where a percentage is undefined.
pub fn evaluate(network: &Network, samples: &[Sample]) -> Result<EvaluationResult> {
    if samples.is_empty() {
        return Err(Error::InvalidArgument("cannot evaluate on an empty dataset".into()));
    }

    let mut correct = 0;
    for sample in samples {
        if network.classify(&sample.values)? == sample.label {
            correct += 1;
        }
    }

    Ok(EvaluationResult {
        correct,
        total: samples.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::network::{LayerParams, NetworkParams, OutputMode};

    /// Output neuron `i` copies input `i` (up to the sigmoid), so the decision is the argmax of
    /// the input.
    fn identity_classifier() -> Network {
        Network::from_params(NetworkParams {
            sizes: vec![3, 3],
            activation: ActivationFunction::Sigmoid,
            mode: OutputMode::Classifier,
            initial_weights_range: 0.5,
            layers: vec![LayerParams {
                weights: vec![
                    vec![1.0, 0.0, 0.0],
                    vec![0.0, 1.0, 0.0],
                    vec![0.0, 0.0, 1.0],
                ],
                biases: vec![0.0; 3],
            }],
        })
        .unwrap()
    }

    fn samples() -> Vec<Sample> {
        (0..7)
            .map(|i| {
                let label = i % 3;
                let mut values = vec![0.1; 3];
                values[label] = 0.9;
                Sample::classification(values, label, 3).unwrap()
            })
            .collect()
    }

    #[test]
    fn all_matching_labels_score_full_marks() {
        let result = evaluate(&identity_classifier(), &samples()).unwrap();
        assert_eq!(result, EvaluationResult { correct: 7, total: 7 });
        assert_eq!(result.percentage(), 100.0);
    }

    #[test]
    fn one_flipped_label_costs_exactly_one_share() {
        let mut data = samples();
        data[3].label = (data[3].label + 1) % 3;
        let result = evaluate(&identity_classifier(), &data).unwrap();
        assert_eq!(result.correct, 6);
        assert_eq!(result.incorrect(), 1);
        let expected = ((100.0 - 100.0 / 7.0) * 100.0_f64).round() / 100.0;
        assert_eq!(result.percentage(), expected);
        assert_eq!(result.percentage(), 85.71);
    }

    #[test]
    fn empty_dataset_is_rejected() {
        assert!(matches!(
            evaluate(&identity_classifier(), &[]),
            Err(Error::InvalidArgument(_))
        ));
    }
}
