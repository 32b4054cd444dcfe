//! Masked fine-tuning loop
//!
//! The training session runs a standard forward/backward/optimizer-step
//! loop, augmented with a post-step re-masking pass that replays the mask
//! registry against the live weights. Optional watermark augmentation
//! appends precomputed labeled samples to each batch.

mod batch;
mod loss;
mod metrics;
mod session;
pub mod watermark;

pub use batch::{one_hot, Batch};
pub use loss::{CrossEntropyLoss, LossFn};
pub use metrics::{Accuracy, Metric, MetricsTracker};
pub use session::{EpochStats, RunSummary, SessionConfig, TrainingSession};
pub use watermark::WatermarkSet;
