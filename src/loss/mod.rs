pub mod mae;
pub mod mse;

pub use mae::AbsoluteError;
pub use mse::QuadraticLoss;
