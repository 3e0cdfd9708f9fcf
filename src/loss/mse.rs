/// Half sum of squared errors, `½ Σ (predicted - expected)²`.
///
/// This is the cost whose gradient backpropagation follows: its derivative with respect to the
/// output is simply `predicted - expected`.
pub struct QuadraticLoss;

impl QuadraticLoss {
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        0.5 * predicted.iter().zip(expected.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
    }

    /// Per-output gradient: predicted - expected
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| a - b)
            .collect()
    }
}
