pub mod mode;
pub mod network;
pub mod params;

pub use mode::{Output, OutputMode};
pub use network::Network;
pub use params::{LayerParams, NetworkParams};
