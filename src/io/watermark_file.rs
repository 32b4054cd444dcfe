//! On-disk watermark data format
//!
//! Four parallel group collections: inner-pattern inputs/labels and
//! outer-pattern inputs/labels. Each collection is a list of groups of
//! samples; inputs are flattened row-major with a shared `sample_shape`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Serialized watermark data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkFile {
    /// Shape of a single input sample (without the batch dimension)
    pub sample_shape: Vec<usize>,
    /// Inner-pattern inputs, grouped
    pub inner_inputs: Vec<Vec<Vec<f32>>>,
    /// Inner-pattern labels, grouped in parallel with `inner_inputs`
    pub inner_labels: Vec<Vec<usize>>,
    /// Outer-pattern inputs, grouped
    pub outer_inputs: Vec<Vec<Vec<f32>>>,
    /// Outer-pattern labels, grouped in parallel with `outer_inputs`
    pub outer_labels: Vec<Vec<usize>>,
}

/// Load watermark data from a JSON file. A missing file is a fatal
/// configuration error, consistent with checkpoint loading.
pub fn load_watermark_file(path: impl AsRef<Path>) -> Result<WatermarkFile> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::Config(format!(
            "watermark file not found: {}",
            path.display()
        )));
    }

    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader)
        .map_err(|e| Error::Serialization(format!("watermark file decode failed: {e}")))
}
