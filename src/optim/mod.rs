//! Optimizers for fine-tuning pruned networks

mod optimizer;
mod sgd;

pub use optimizer::Optimizer;
pub use sgd::SGD;
