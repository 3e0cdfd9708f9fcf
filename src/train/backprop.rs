use crate::error::{Error, Result};
use crate::loss::QuadraticLoss;
use crate::math::{vector, Matrix};
use crate::network::Network;

/// Per-layer gradients for a single sample, plus the network's output for it.
///
/// `nabla_weights[i]` and `nabla_biases[i]` have the shapes of the `i`-th trainable layer's
/// weights and biases.
#[derive(Debug, Clone, PartialEq)]
pub struct BackpropResult {
    pub nabla_weights: Vec<Matrix>,
    pub nabla_biases: Vec<Vec<f64>>,
    pub solution: Vec<f64>,
}

/// Reverse-mode gradient of `½ Σ (output - expected)²` with respect to every weight and bias.
///
/// ```text
/// δ_L = (a_L - expected) ⊙ f'(z_L)
/// δ_l = (W_{l+1}ᵀ · δ_{l+1}) ⊙ f'(z_l)
/// ∇b_l = δ_l,  ∇W_l = δ_l ⊗ a_{l-1}
/// ```
///
/// `z` is a layer's net and `a` its activated output; `a_0` is the raw input.
pub fn backpropagate(network: &Network, input: &[f64], expected: &[f64]) -> Result<BackpropResult> {
    if expected.len() != network.output_size() {
        return Err(Error::mismatch("expected output", network.output_size(), expected.len()));
    }

    let layers = network.layers();
    let count = layers.len();

    // Forward pass keeping every net and activation; index 0 is the input itself.
    let mut nets: Vec<Vec<f64>> = Vec::with_capacity(count + 1);
    let mut activations: Vec<Vec<f64>> = Vec::with_capacity(count + 1);
    nets.push(input.to_vec());
    activations.push(input.to_vec());
    for layer in layers {
        let net = layer.net(&activations[activations.len() - 1])?;
        activations.push(layer.activation(&net));
        nets.push(net);
    }

    let mut nabla_weights = vec![Matrix::default(); count];
    let mut nabla_biases = vec![Vec::new(); count];

    let output = &activations[count];
    let error = QuadraticLoss::derivative(output, expected);
    let mut delta = vector::hadamard(&error, &layers[count - 1].activation_prime(&nets[count]));
    nabla_weights[count - 1] = Matrix::outer(&delta, &activations[count - 1]);
    nabla_biases[count - 1] = delta.clone();

    for l in (0..count - 1).rev() {
        let propagated = layers[l + 1].weights.transpose_mul_vec(&delta)?;
        delta = vector::hadamard(&propagated, &layers[l].activation_prime(&nets[l + 1]));
        nabla_weights[l] = Matrix::outer(&delta, &activations[l]);
        nabla_biases[l] = delta.clone();
    }

    Ok(BackpropResult {
        nabla_weights,
        nabla_biases,
        solution: activations.pop().unwrap_or_default(),
    })
}

impl Network {
    /// See [`backpropagate`].
    pub fn backpropagate(&self, input: &[f64], expected: &[f64]) -> Result<BackpropResult> {
        backpropagate(self, input, expected)
    }
}
