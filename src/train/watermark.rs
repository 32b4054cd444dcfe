//! Watermark sample set for robustness fine-tuning

use super::batch::{one_hot, Batch};
use crate::io::{load_watermark_file, WatermarkFile};
use crate::{Error, Result, Tensor};
use ndarray::Array1;
use rand::Rng;
use std::path::Path;

/// The precomputed watermark samples appended to training batches.
///
/// Built once at startup when watermark fine-tuning is enabled, immutable
/// afterwards. Samples are read with wrap-around indexing: a base offset is
/// drawn once per epoch and batch `i` selects sample `(offset + i) % len`,
/// so each epoch cycles through the set with a different alignment while
/// staying deterministic within the epoch.
#[derive(Debug, Clone)]
pub struct WatermarkSet {
    inputs: Vec<Tensor>,
    labels: Vec<usize>,
}

impl WatermarkSet {
    /// Load and filter the watermark set from a watermark file on disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = load_watermark_file(path)?;
        Self::from_records(&file)
    }

    /// Build the set from decoded watermark data.
    ///
    /// Inner and outer patterns are interleaved per group in file order.
    /// All-zero placeholder inputs carry no training signal and are
    /// filtered out. An empty result is a configuration error: wrap-around
    /// indexing over zero samples is meaningless.
    pub fn from_records(file: &WatermarkFile) -> Result<Self> {
        let groups = file.inner_inputs.len();
        if file.inner_labels.len() != groups
            || file.outer_inputs.len() != groups
            || file.outer_labels.len() != groups
        {
            return Err(Error::Config(format!(
                "watermark group counts diverge: inner {}x{}, outer {}x{}",
                file.inner_inputs.len(),
                file.inner_labels.len(),
                file.outer_inputs.len(),
                file.outer_labels.len()
            )));
        }

        let mut inputs = Vec::new();
        let mut labels = Vec::new();

        for g in 0..groups {
            push_group(
                &file.inner_inputs[g],
                &file.inner_labels[g],
                &file.sample_shape,
                &mut inputs,
                &mut labels,
            )?;
            push_group(
                &file.outer_inputs[g],
                &file.outer_labels[g],
                &file.sample_shape,
                &mut inputs,
                &mut labels,
            )?;
        }

        if inputs.is_empty() {
            return Err(Error::Config(
                "watermark set is empty after filtering placeholder samples".to_string(),
            ));
        }

        Ok(Self { inputs, labels })
    }

    /// Number of usable watermark samples
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Always false: construction rejects empty sets
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Draw the per-epoch base offset
    pub fn draw_offset<R: Rng>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..self.len())
    }

    /// Select the sample for a batch index under the epoch's base offset
    pub fn select(&self, offset: usize, batch_idx: usize) -> (&Tensor, usize) {
        let idx = (offset + batch_idx) % self.len();
        (&self.inputs[idx], self.labels[idx])
    }

    /// The selected sample as a one-row batch, ready for concatenation
    pub fn sample_batch(&self, offset: usize, batch_idx: usize, num_classes: usize) -> Batch {
        let (input, label) = self.select(offset, batch_idx);
        let targets = Tensor::with_shape(
            Array1::from_vec(one_hot(label, num_classes)),
            vec![1, num_classes],
            false,
        );
        Batch::new(input.clone(), targets)
    }
}

fn push_group(
    group_inputs: &[Vec<f32>],
    group_labels: &[usize],
    sample_shape: &[usize],
    inputs: &mut Vec<Tensor>,
    labels: &mut Vec<usize>,
) -> Result<()> {
    if group_inputs.len() != group_labels.len() {
        return Err(Error::Config(format!(
            "watermark group has {} inputs but {} labels",
            group_inputs.len(),
            group_labels.len()
        )));
    }

    let sample_len: usize = sample_shape.iter().product();
    for (sample, &label) in group_inputs.iter().zip(group_labels) {
        if sample.len() != sample_len {
            return Err(Error::Config(format!(
                "watermark sample has {} values, expected {sample_len} for shape {sample_shape:?}",
                sample.len()
            )));
        }

        // All-zero placeholders are padding, not training signal
        if sample.iter().all(|&v| v == 0.0) {
            continue;
        }

        let mut shape = vec![1];
        shape.extend_from_slice(sample_shape);
        inputs.push(Tensor::with_shape(
            Array1::from_vec(sample.clone()),
            shape,
            false,
        ));
        labels.push(label);
    }
    Ok(())
}
