use crate::{math::Matrix, layers::Layer};

/// Mini-batch gradient descent with classic (heavy-ball) momentum:
///
/// ```text
/// Δ = (learning_rate / batch_size) · ∇ + momentum · Δ_prev
/// θ ← θ - Δ
/// ```
pub struct Sgd {
    pub learning_rate: f64,
    pub momentum: f64,
}

/// The previous update applied to one layer, carried into the next step.
#[derive(Debug, Clone, PartialEq)]
pub struct Velocity {
    pub weights: Matrix,
    pub biases: Vec<f64>,
}

impl Velocity {
    /// Zero velocity shaped like `layer`; the first step then has no momentum contribution.
    pub fn zeroed(layer: &Layer) -> Velocity {
        Velocity {
            weights: layer.zeroed_weights(),
            biases: layer.zeroed_biases(),
        }
    }

    pub fn clear(&mut self) {
        self.weights.clear();
        self.biases.iter_mut().for_each(|b| *b = 0.0);
    }
}

impl Sgd {
    pub fn new(learning_rate: f64, momentum: f64) -> Sgd {
        Sgd { learning_rate, momentum }
    }

    /// Applies one update to `layer` from gradients summed over `batch_size` samples, and
    /// records the applied change in `velocity`.
    pub fn step(
        &self,
        layer: &mut Layer,
        weights_grad: &Matrix,
        biases_grad: &[f64],
        batch_size: usize,
        velocity: &mut Velocity,
    ) {
        let rate = self.learning_rate / batch_size as f64;

        let mut weights_change = weights_grad * rate;
        weights_change += &(&velocity.weights * self.momentum);
        layer.weights -= &weights_change;

        let biases_change: Vec<f64> = biases_grad.iter().zip(&velocity.biases)
            .map(|(g, prev)| rate * g + self.momentum * prev)
            .collect();
        for (b, change) in layer.biases.iter_mut().zip(&biases_change) {
            *b -= change;
        }

        velocity.weights = weights_change;
        velocity.biases = biases_change;
    }
}
