use serde::{Deserialize, Serialize};

/// How a network's final layer output is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// The output is a score per class; the decision is the argmax.
    #[default]
    Classifier,
    /// Autoencoder: the output is a reconstruction of the input.
    Reconstruction,
}

/// Result of [`Network::compute`](crate::Network::compute).
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Class(usize),
    Reconstruction(Vec<f64>),
}

impl Output {
    pub fn class(&self) -> Option<usize> {
        match self {
            Output::Class(c) => Some(*c),
            Output::Reconstruction(_) => None,
        }
    }

    pub fn reconstruction(&self) -> Option<&[f64]> {
        match self {
            Output::Class(_) => None,
            Output::Reconstruction(v) => Some(v),
        }
    }
}
