use serde::{Serialize, Deserialize};

use crate::activation::ActivationFunction;
use crate::error::Result;
use crate::network::mode::OutputMode;

/// Stored parameters of one trainable layer.
///
/// - `weights` — `neurons × inputs`, one row per neuron
/// - `biases`  — one entry per neuron
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerParams {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

/// The full parameter bundle of a [`Network`](crate::Network).
///
/// This is the only shape the network is persisted in. Building a network from it goes through
/// `Network::from_params`, which checks every layer against `sizes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkParams {
    /// Layer sizes, input first: `[n0, n1, ..., nk]`.
    pub sizes: Vec<usize>,
    pub activation: ActivationFunction,
    #[serde(default)]
    pub mode: OutputMode,
    #[serde(default = "default_initial_weights_range")]
    pub initial_weights_range: f64,
    /// One entry per trainable layer (`sizes.len() - 1` of them), input side first.
    pub layers: Vec<LayerParams>,
}

fn default_initial_weights_range() -> f64 {
    0.5
}

impl NetworkParams {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parses a parameter bundle. An unrecognized activation name is reported as
    /// `InvalidConfiguration`; every other malformation as a JSON error.
    pub fn from_json(json: &str) -> Result<NetworkParams> {
        #[derive(Deserialize)]
        struct ActivationName {
            activation: String,
        }

        if let Ok(named) = serde_json::from_str::<ActivationName>(json) {
            named.activation.parse::<ActivationFunction>()?;
        }
        Ok(serde_json::from_str(json)?)
    }
}
