pub mod options;
pub mod runner;
pub mod session;

pub use options::TrainOptions;
pub use runner::{run_experiment, ExperimentKind, SweepValue};
pub use session::{train_on_mnist, train_on_mnist_with};
