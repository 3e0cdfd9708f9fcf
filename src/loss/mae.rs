/// Absolute error summed over output components, `Σ |predicted - expected|`.
///
/// Reported as the training error; averaged over a batch it gives the per-epoch error.
pub struct AbsoluteError;

impl AbsoluteError {
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted.iter().zip(expected.iter())
            .map(|(p, y)| (p - y).abs())
            .sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::QuadraticLoss;

    #[test]
    fn absolute_error_is_summed_not_averaged() {
        assert!((AbsoluteError::loss(&[1.0, -1.0, 0.0], &[0.5, 0.5, 0.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn quadratic_derivative_is_residual() {
        assert_eq!(QuadraticLoss::derivative(&[0.75, 0.0], &[0.25, 1.0]), vec![0.5, -1.0]);
        assert!((QuadraticLoss::loss(&[0.75, 0.0], &[0.25, 1.0]) - 0.625).abs() < 1e-12);
    }
}
