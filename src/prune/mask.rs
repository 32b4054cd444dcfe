//! Binary keep/prune mask congruent to one weight tensor

use crate::{Error, Result, Tensor};
use serde::{Deserialize, Serialize};

/// A binary mask over one weight tensor: 1.0 keeps the weight, 0.0 forces it
/// to zero. The shape is fixed at construction and never changes for the
/// lifetime of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PruneMask {
    values: Vec<f32>,
    shape: Vec<usize>,
}

impl PruneMask {
    /// Create a mask from 0/1 values and the shape of the tensor it covers.
    ///
    /// # Panics
    ///
    /// Panics if the shape's element count does not match the value count.
    pub fn new(values: Vec<f32>, shape: Vec<usize>) -> Self {
        assert_eq!(
            values.len(),
            shape.iter().product::<usize>(),
            "mask shape {shape:?} does not match value count {}",
            values.len()
        );
        Self { values, shape }
    }

    /// Mask values, flattened
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Mask shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of positions covered
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a mask over an empty tensor
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of positions forced to zero
    pub fn pruned_count(&self) -> usize {
        self.values.iter().filter(|&&v| v == 0.0).count()
    }

    /// Number of positions kept
    pub fn kept_count(&self) -> usize {
        self.len() - self.pruned_count()
    }

    /// Fraction of positions forced to zero
    pub fn sparsity(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.pruned_count() as f32 / self.len() as f32
        }
    }

    /// Overwrite the weight tensor with `weight ⊙ mask` in place.
    ///
    /// Fails fast on any shape divergence; masks are never broadcast or
    /// truncated against a weight tensor.
    pub fn apply(&self, address: &str, weight: &Tensor) -> Result<()> {
        if self.shape != weight.shape() {
            return Err(Error::ShapeMismatch {
                address: address.to_string(),
                mask: self.shape.clone(),
                weight: weight.shape().to_vec(),
            });
        }

        let mut data = weight.data_mut();
        for (w, m) in data.iter_mut().zip(self.values.iter()) {
            *w *= m;
        }
        Ok(())
    }

    /// True when every pruned position of the weight tensor is exactly zero
    pub fn is_enforced(&self, weight: &Tensor) -> bool {
        self.shape == weight.shape()
            && weight
                .data()
                .iter()
                .zip(self.values.iter())
                .all(|(&w, &m)| m == 1.0 || w == 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_sparsity() {
        let mask = PruneMask::new(vec![0.0, 1.0, 1.0, 0.0], vec![4]);
        assert_eq!(mask.pruned_count(), 2);
        assert_eq!(mask.kept_count(), 2);
        assert_eq!(mask.sparsity(), 0.5);
    }

    #[test]
    fn test_empty_mask() {
        let mask = PruneMask::new(vec![], vec![0]);
        assert!(mask.is_empty());
        assert_eq!(mask.sparsity(), 0.0);
    }

    #[test]
    fn test_apply_zeroes_pruned_positions() {
        let mask = PruneMask::new(vec![1.0, 0.0], vec![2]);
        let weight = Tensor::from_vec(vec![3.0, 4.0], false);

        mask.apply("layer.weight", &weight).unwrap();

        assert_eq!(weight.data().to_vec(), vec![3.0, 0.0]);
        assert!(mask.is_enforced(&weight));
    }

    #[test]
    fn test_apply_shape_mismatch_is_fatal() {
        let mask = PruneMask::new(vec![1.0, 0.0], vec![2]);
        let weight = Tensor::from_vec(vec![3.0, 4.0, 5.0], false);

        let err = mask.apply("layer.weight", &weight).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_serde_round_trip() {
        let mask = PruneMask::new(vec![1.0, 0.0, 1.0, 1.0, 0.0, 1.0], vec![2, 3]);
        let json = serde_json::to_string(&mask).unwrap();
        let back: PruneMask = serde_json::from_str(&json).unwrap();
        assert_eq!(mask, back);
    }
}
