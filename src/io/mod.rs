//! Checkpoint, watermark, and result-file persistence

mod checkpoint;
mod results;
mod watermark_file;

pub use checkpoint::{
    load_checkpoint, save_checkpoint, Checkpoint, CheckpointManager, WeightRecord,
};
pub use results::ResultsFile;
pub use watermark_file::{load_watermark_file, WatermarkFile};
