use std::path::Path;

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::ActivationFunction;
use crate::data::Sample;
use crate::error::{Error, Result};
use crate::eval::{self, EvaluationResult};
use crate::layers::Layer;
use crate::math::{vector, Matrix};
use crate::network::mode::{Output, OutputMode};
use crate::network::params::{LayerParams, NetworkParams};

/// Feed-forward network: an identity input pass-through followed by `sizes.len() - 1`
/// trainable layers, the last of which is the output layer.
///
/// The trainable layer list is built once at construction and never resized; training only
/// mutates the values inside each layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "NetworkParams", try_from = "NetworkParams")]
pub struct Network {
    sizes: Vec<usize>,
    activation: ActivationFunction,
    mode: OutputMode,
    initial_weights_range: f64,
    layers: Vec<Layer>,
}

impl Network {
    /// Builds a network with layer sizes `[n0, ..., nk]`, drawing every weight and bias
    /// uniformly from `[-initial_weights_range, initial_weights_range]`.
    pub fn new<R: Rng + ?Sized>(
        activation: ActivationFunction,
        initial_weights_range: f64,
        sizes: &[usize],
        mode: OutputMode,
        rng: &mut R,
    ) -> Result<Network> {
        validate_sizes(sizes)?;
        validate_initial_weights_range(initial_weights_range)?;

        let layers = sizes
            .windows(2)
            .map(|pair| Layer::new(pair[0], pair[1], activation, initial_weights_range, rng))
            .collect();

        Ok(Network {
            sizes: sizes.to_vec(),
            activation,
            mode,
            initial_weights_range,
            layers,
        })
    }

    /// Rebuilds a network from a complete parameter bundle, validating every layer shape.
    pub fn from_params(params: NetworkParams) -> Result<Network> {
        validate_sizes(&params.sizes)?;
        validate_initial_weights_range(params.initial_weights_range)?;
        let expected_layers = params.sizes.len() - 1;
        if params.layers.len() != expected_layers {
            return Err(Error::mismatch("network layer count", expected_layers, params.layers.len()));
        }

        let mut layers = Vec::with_capacity(expected_layers);
        for (i, layer) in params.layers.into_iter().enumerate() {
            let weights = Matrix::from_rows(layer.weights)?;
            let (inputs, neurons) = (params.sizes[i], params.sizes[i + 1]);
            if weights.rows != neurons {
                return Err(Error::mismatch("layer weight rows", neurons, weights.rows));
            }
            if weights.cols != inputs {
                return Err(Error::mismatch("layer weight columns", inputs, weights.cols));
            }
            layers.push(Layer::from_parameters(
                weights,
                layer.biases,
                params.activation,
                params.initial_weights_range,
            )?);
        }

        Ok(Network {
            sizes: params.sizes,
            activation: params.activation,
            mode: params.mode,
            initial_weights_range: params.initial_weights_range,
            layers,
        })
    }

    pub fn to_params(&self) -> NetworkParams {
        NetworkParams {
            sizes: self.sizes.clone(),
            activation: self.activation,
            mode: self.mode,
            initial_weights_range: self.initial_weights_range,
            layers: self
                .layers
                .iter()
                .map(|layer| LayerParams {
                    weights: layer.weights.data.clone(),
                    biases: layer.biases.clone(),
                })
                .collect(),
        }
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn activation(&self) -> ActivationFunction {
        self.activation
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn initial_weights_range(&self) -> f64 {
        self.initial_weights_range
    }

    pub fn input_size(&self) -> usize {
        self.sizes[0]
    }

    pub fn output_size(&self) -> usize {
        self.sizes[self.sizes.len() - 1]
    }

    /// All trainable layers, input side first; the last one is the output layer.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn hidden_layers(&self) -> &[Layer] {
        &self.layers[..self.layers.len() - 1]
    }

    pub fn output_layer(&self) -> &Layer {
        &self.layers[self.layers.len() - 1]
    }

    /// Threads `input` through every layer and returns the output layer's activations.
    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.feedforward(&current)?;
        }
        Ok(current)
    }

    /// Index of the largest output; ties go to the lowest index.
    pub fn classify(&self, input: &[f64]) -> Result<usize> {
        let output = self.forward(input)?;
        vector::argmax(&output).ok_or_else(|| Error::InvalidArgument("network has an empty output layer".into()))
    }

    /// Forward pass interpreted according to the network's [`OutputMode`].
    pub fn compute(&self, input: &[f64]) -> Result<Output> {
        match self.mode {
            OutputMode::Classifier => self.classify(input).map(Output::Class),
            OutputMode::Reconstruction => self.forward(input).map(Output::Reconstruction),
        }
    }

    pub fn evaluate(&self, samples: &[Sample]) -> Result<EvaluationResult> {
        eval::evaluate(self, samples)
    }

    /// Normalized weight rows of the first trainable layer, grouped per layer.
    pub fn features(&self) -> Vec<Vec<Vec<f64>>> {
        vec![self.layers[0].features()]
    }

    pub fn to_serialized_form(&self) -> Result<String> {
        Ok(self.to_params().to_json()?)
    }

    pub fn from_serialized_form(serialized: &str) -> Result<Network> {
        Network::from_params(NetworkParams::from_json(serialized)?)
    }

    /// Serializes the network to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_serialized_form()?)?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Network> {
        let json = std::fs::read_to_string(path)?;
        Network::from_serialized_form(&json)
    }
}

impl From<Network> for NetworkParams {
    fn from(network: Network) -> Self {
        network.to_params()
    }
}

impl TryFrom<NetworkParams> for Network {
    type Error = Error;

    fn try_from(params: NetworkParams) -> Result<Self> {
        Network::from_params(params)
    }
}

fn validate_sizes(sizes: &[usize]) -> Result<()> {
    if sizes.len() < 2 {
        return Err(Error::InvalidConfiguration(format!(
            "a network needs at least an input and an output size, got {sizes:?}"
        )));
    }
    if sizes.contains(&0) {
        return Err(Error::InvalidConfiguration(format!(
            "layer sizes must be positive, got {sizes:?}"
        )));
    }
    Ok(())
}

/// Fresh weights are drawn from `[-range, range]`, so the range must be a usable bound.
fn validate_initial_weights_range(range: f64) -> Result<()> {
    if !(range.is_finite() && range >= 0.0) {
        return Err(Error::InvalidConfiguration(format!(
            "initial weights range must be finite and >= 0, got {range}"
        )));
    }
    Ok(())
}
