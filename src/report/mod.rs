pub mod csv;

pub use csv::{experiment_log, training_log, write_log};
