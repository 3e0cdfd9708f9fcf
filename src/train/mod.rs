pub mod backprop;
pub mod epoch_stats;
pub mod reconstruction;
pub mod train_config;
pub mod trainer;
pub mod training_result;

pub use backprop::{backpropagate, BackpropResult};
pub use epoch_stats::EpochStats;
pub use reconstruction::ReconstructionLog;
pub use train_config::TrainingConfig;
pub use trainer::{train_network, Trainer, TrainerState};
pub use training_result::TrainingResult;
