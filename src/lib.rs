pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod data;
pub mod eval;
pub mod loss;
pub mod optim;
pub mod train;
pub mod report;
pub mod experiment;

// Convenience re-exports
pub use error::{Error, Result};
pub use math::Matrix;
pub use activation::ActivationFunction;
pub use layers::Layer;
pub use network::{Network, Output, OutputMode};
pub use data::{DatasetCache, Sample};
pub use eval::{evaluate, EvaluationResult};
pub use optim::Sgd;
pub use train::{train_network, Trainer, TrainerState, TrainingConfig, TrainingResult};
pub use experiment::TrainOptions;
