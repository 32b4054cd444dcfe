//! Batch data structure

use crate::{Error, Result, Tensor};

/// A training batch: inputs shaped `[batch, features..]` and one-hot targets
/// shaped `[batch, classes]`, both flattened row-major.
#[derive(Clone, Debug)]
pub struct Batch {
    /// Input features
    pub inputs: Tensor,
    /// One-hot target labels
    pub targets: Tensor,
}

impl Batch {
    /// Create a new batch
    pub fn new(inputs: Tensor, targets: Tensor) -> Self {
        Self { inputs, targets }
    }

    /// Number of samples (leading dimension of the inputs)
    pub fn size(&self) -> usize {
        self.inputs.shape().first().copied().unwrap_or(0)
    }

    /// Concatenate another batch along the batch dimension.
    ///
    /// Used by watermark augmentation to append watermark samples to a
    /// regular minibatch. Trailing dimensions must agree on both sides.
    pub fn concat(&self, other: &Batch) -> Result<Batch> {
        let inputs = concat_tensors(&self.inputs, &other.inputs)?;
        let targets = concat_tensors(&self.targets, &other.targets)?;
        Ok(Batch::new(inputs, targets))
    }
}

fn concat_tensors(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    if a.shape().len() != b.shape().len() || a.shape()[1..] != b.shape()[1..] {
        return Err(Error::Config(format!(
            "cannot concatenate batches: trailing dims differ ({:?} vs {:?})",
            a.shape(),
            b.shape()
        )));
    }

    let mut data = a.data().to_vec();
    data.extend(b.data().iter());

    let mut shape = a.shape().to_vec();
    shape[0] += b.shape()[0];
    Ok(Tensor::with_shape(
        ndarray::Array1::from_vec(data),
        shape,
        false,
    ))
}

/// One-hot encode a class label
pub fn one_hot(label: usize, num_classes: usize) -> Vec<f32> {
    let mut row = vec![0.0; num_classes];
    if label < num_classes {
        row[label] = 1.0;
    }
    row
}
