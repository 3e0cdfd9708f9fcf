use serde::{Serialize, Deserialize};
use std::f64::consts::E;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Element-wise nonlinearity shared by every trainable layer of a network.
///
/// Names deserialize through [`FromStr`], so `"tanh"` and `"Tanh"` are both accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ActivationFunction {
    Sigmoid,
    Tanh,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::Tanh => x.tanh(),
        }
    }

    /// Derivative evaluated at the pre-activation `x` (the layer's net), not at the
    /// activated output.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            }
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
        }
    }

    pub fn apply(&self, net: &[f64]) -> Vec<f64> {
        net.iter().map(|&x| self.function(x)).collect()
    }

    pub fn prime(&self, net: &[f64]) -> Vec<f64> {
        net.iter().map(|&x| self.derivative(x)).collect()
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationFunction::Sigmoid => write!(f, "sigmoid"),
            ActivationFunction::Tanh => write!(f, "tanh"),
        }
    }
}

impl FromStr for ActivationFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sigmoid" => Ok(ActivationFunction::Sigmoid),
            "tanh" => Ok(ActivationFunction::Tanh),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown activation function '{other}' (expected sigmoid or tanh)"
            ))),
        }
    }
}

impl TryFrom<String> for ActivationFunction {
    type Error = Error;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}
