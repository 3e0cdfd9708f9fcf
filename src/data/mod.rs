pub mod cache;
pub mod mnist;
pub mod sample;
pub mod viewer;

pub use cache::{DatasetCache, DatasetKey, DatasetRole};
pub use mnist::MnistImage;
pub use sample::Sample;
