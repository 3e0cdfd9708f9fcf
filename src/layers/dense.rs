use rand::Rng;

use crate::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::math::{vector, Matrix};

/// Fully-connected layer: `output = activation(W · input + b)`.
///
/// `weights` is `neurons × inputs`, `biases` has one entry per neuron. The shape is fixed at
/// construction; training mutates the values in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub weights: Matrix,
    pub biases: Vec<f64>,
    pub activator: ActivationFunction,
    /// Half-width of the uniform distribution used for freshly drawn parameters.
    pub initial_weights_range: f64,
}

impl Layer {
    pub fn new<R: Rng + ?Sized>(
        inputs: usize,
        neurons: usize,
        activation: ActivationFunction,
        initial_weights_range: f64,
        rng: &mut R,
    ) -> Layer {
        let weights = Matrix::uniform(neurons, inputs, initial_weights_range, rng);
        let biases = vector::uniform(neurons, initial_weights_range, rng);

        Layer {
            weights,
            biases,
            activator: activation,
            initial_weights_range,
        }
    }

    /// Rebuilds a layer from stored parameters, checking that weights and biases agree.
    pub fn from_parameters(
        weights: Matrix,
        biases: Vec<f64>,
        activation: ActivationFunction,
        initial_weights_range: f64,
    ) -> Result<Layer> {
        if weights.rows != biases.len() {
            return Err(Error::mismatch("layer biases", weights.rows, biases.len()));
        }
        Ok(Layer {
            weights,
            biases,
            activator: activation,
            initial_weights_range,
        })
    }

    pub fn inputs(&self) -> usize {
        self.weights.cols
    }

    pub fn neurons(&self) -> usize {
        self.weights.rows
    }

    pub fn feedforward(&self, input: &[f64]) -> Result<Vec<f64>> {
        let net = self.net(input)?;
        Ok(self.activation(&net))
    }

    /// Pre-activation `W · input + b`.
    pub fn net(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.inputs() {
            return Err(Error::mismatch("layer input", self.inputs(), input.len()));
        }
        let mut net = self.weights.mul_vec(input)?;
        vector::add_assign(&mut net, &self.biases);
        Ok(net)
    }

    /// Applies the activation to an already computed net.
    pub fn activation(&self, net: &[f64]) -> Vec<f64> {
        self.activator.apply(net)
    }

    /// Activation derivative evaluated at the net.
    pub fn activation_prime(&self, net: &[f64]) -> Vec<f64> {
        self.activator.prime(net)
    }

    /// A weights-shaped matrix, either zeroed (gradient accumulators) or freshly drawn from
    /// `[-range, range]`.
    pub fn new_weights_matrix<R: Rng + ?Sized>(&self, zeroed: bool, rng: &mut R) -> Matrix {
        if zeroed {
            return self.zeroed_weights();
        }
        Matrix::uniform(self.neurons(), self.inputs(), self.initial_weights_range, rng)
    }

    pub fn new_biases_vector<R: Rng + ?Sized>(&self, zeroed: bool, rng: &mut R) -> Vec<f64> {
        if zeroed {
            return self.zeroed_biases();
        }
        vector::uniform(self.neurons(), self.initial_weights_range, rng)
    }

    pub fn zeroed_weights(&self) -> Matrix {
        Matrix::zeros(self.neurons(), self.inputs())
    }

    pub fn zeroed_biases(&self) -> Vec<f64> {
        vec![0.0; self.neurons()]
    }

    /// Each neuron's incoming weight row scaled to unit L2 norm. A neuron whose weights are
    /// all zero keeps its zero row.
    pub fn features(&self) -> Vec<Vec<f64>> {
        self.weights
            .data
            .iter()
            .map(|row| {
                let norm = vector::l2_norm(row);
                if norm == 0.0 {
                    row.clone()
                } else {
                    vector::scale(row, 1.0 / norm)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed_layer(activation: ActivationFunction) -> Layer {
        let weights = Matrix::from_rows(vec![vec![0.5, -1.0], vec![2.0, 0.0], vec![0.0, 0.0]]).unwrap();
        Layer::from_parameters(weights, vec![0.1, -0.2, 0.0], activation, 0.5).unwrap()
    }

    #[test]
    fn net_is_affine_map() {
        let layer = fixed_layer(ActivationFunction::Sigmoid);
        let net = layer.net(&[1.0, 2.0]).unwrap();
        assert_eq!(net, vec![0.5 - 2.0 + 0.1, 2.0 - 0.2, 0.0]);
    }

    #[test]
    fn feedforward_applies_activation_to_net() {
        let layer = fixed_layer(ActivationFunction::Tanh);
        let net = layer.net(&[0.3, -0.4]).unwrap();
        let out = layer.feedforward(&[0.3, -0.4]).unwrap();
        for (n, o) in net.iter().zip(&out) {
            assert_eq!(*o, n.tanh());
        }
    }

    #[test]
    fn wrong_input_length_is_a_dimension_mismatch() {
        let layer = fixed_layer(ActivationFunction::Sigmoid);
        assert!(matches!(
            layer.feedforward(&[1.0, 2.0, 3.0]),
            Err(Error::DimensionMismatch { expected: 2, got: 3, .. })
        ));
    }

    #[test]
    fn shapes_follow_neurons_by_inputs() {
        let mut rng = StdRng::seed_from_u64(1);
        let layer = Layer::new(4, 3, ActivationFunction::Sigmoid, 0.5, &mut rng);
        assert_eq!((layer.weights.rows, layer.weights.cols), (3, 4));
        assert_eq!(layer.biases.len(), 3);

        let zeros = layer.new_weights_matrix(true, &mut rng);
        assert_eq!(zeros, Matrix::zeros(3, 4));
        assert_eq!(layer.new_biases_vector(true, &mut rng), vec![0.0; 3]);

        let fresh = layer.new_weights_matrix(false, &mut rng);
        assert!(fresh.same_shape(&layer.weights));
        assert!(fresh.data.iter().flatten().all(|x| x.abs() <= 0.5));
    }

    #[test]
    fn features_are_unit_rows() {
        let layer = fixed_layer(ActivationFunction::Sigmoid);
        let features = layer.features();
        assert!((vector::l2_norm(&features[0]) - 1.0).abs() < 1e-12);
        assert_eq!(features[1], vec![1.0, 0.0]);
        assert_eq!(features[2], vec![0.0, 0.0]);
    }

    #[test]
    fn mismatched_bias_length_is_rejected() {
        let weights = Matrix::zeros(2, 3);
        assert!(Layer::from_parameters(weights, vec![0.0], ActivationFunction::Tanh, 0.1).is_err());
    }
}
