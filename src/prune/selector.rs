//! Magnitude-ranked weight selection

use super::mask::PruneMask;
use crate::{Error, Result, Tensor};
use ndarray::Array1;

/// Compute a pruned copy of `weights` and its keep/prune mask.
///
/// Elements are ranked by ascending absolute value; the `round(fraction * n)`
/// lowest-ranked elements are forced to zero and the rest are kept
/// unchanged. Ties between equal magnitudes break by flat index: the
/// lower-indexed element is ranked lower and pruned first, which makes the
/// boundary deterministic.
///
/// The inputs are untouched; the caller decides whether to commit the pruned
/// tensor back into the model.
///
/// An empty tensor yields an empty mask and is not an error. A fraction
/// outside `[0, 1]` is a configuration error.
pub fn prune_by_magnitude(weights: &Tensor, fraction: f32) -> Result<(Tensor, PruneMask)> {
    if !(0.0..=1.0).contains(&fraction) || fraction.is_nan() {
        return Err(Error::Config(format!(
            "prune fraction ({fraction}) must be between 0.0 and 1.0"
        )));
    }

    let data = weights.data();
    let n = data.len();
    let prune_count = (f64::from(fraction) * n as f64).round() as usize;

    // Ascending rank over |w|; stable sort keeps equal magnitudes in flat
    // index order.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        data[a]
            .abs()
            .partial_cmp(&data[b].abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut mask = vec![1.0f32; n];
    for &idx in &order[..prune_count] {
        mask[idx] = 0.0;
    }

    let pruned: Array1<f32> = data
        .iter()
        .zip(mask.iter())
        .map(|(&w, &m)| w * m)
        .collect();

    let pruned = Tensor::with_shape(pruned, weights.shape().to_vec(), weights.requires_grad());
    let mask = PruneMask::new(mask, weights.shape().to_vec());
    Ok((pruned, mask))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_fraction_scenario() {
        // Two smallest magnitudes (0.1, -0.2) go, the rest stay.
        let weights = Tensor::from_vec(vec![0.1, -0.9, 0.3, -0.2], false);
        let (pruned, mask) = prune_by_magnitude(&weights, 0.5).unwrap();

        assert_eq!(mask.values(), &[0.0, 1.0, 1.0, 0.0]);
        assert_eq!(pruned.data().to_vec(), vec![0.0, -0.9, 0.3, 0.0]);
        // Original untouched
        assert_eq!(weights.data().to_vec(), vec![0.1, -0.9, 0.3, -0.2]);
    }

    #[test]
    fn test_exact_prune_count() {
        let weights = Tensor::from_vec(vec![5.0, 1.0, 4.0, 2.0, 3.0], false);
        let (_, mask) = prune_by_magnitude(&weights, 0.4).unwrap();
        // round(0.4 * 5) = 2
        assert_eq!(mask.pruned_count(), 2);
        assert_eq!(mask.values(), &[1.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_rounding_at_odd_counts() {
        let weights = Tensor::from_vec(vec![1.0, 2.0, 3.0], false);
        // round(0.5 * 3) = 2
        let (_, mask) = prune_by_magnitude(&weights, 0.5).unwrap();
        assert_eq!(mask.pruned_count(), 2);
    }

    #[test]
    fn test_duplicate_magnitudes_prune_lowest_index_first() {
        let weights = Tensor::from_vec(vec![0.5, -0.5, 0.5, 0.5], false);
        let (_, mask) = prune_by_magnitude(&weights, 0.5).unwrap();
        // All magnitudes tie; flat-index tie-break prunes positions 0 and 1.
        assert_eq!(mask.values(), &[0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_zero_fraction_keeps_everything() {
        let weights = Tensor::from_vec(vec![1.0, 2.0], false);
        let (pruned, mask) = prune_by_magnitude(&weights, 0.0).unwrap();
        assert_eq!(mask.pruned_count(), 0);
        assert_eq!(pruned.data().to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_full_fraction_prunes_everything() {
        let weights = Tensor::from_vec(vec![1.0, 2.0], false);
        let (pruned, mask) = prune_by_magnitude(&weights, 1.0).unwrap();
        assert_eq!(mask.pruned_count(), 2);
        assert_eq!(pruned.data().to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_empty_tensor_yields_empty_mask() {
        let weights = Tensor::from_vec(vec![], false);
        let (pruned, mask) = prune_by_magnitude(&weights, 0.5).unwrap();
        assert!(pruned.is_empty());
        assert!(mask.is_empty());
    }

    #[test]
    fn test_invalid_fraction_is_config_error() {
        let weights = Tensor::from_vec(vec![1.0], false);
        assert!(prune_by_magnitude(&weights, 1.5).is_err());
        assert!(prune_by_magnitude(&weights, -0.1).is_err());
        assert!(prune_by_magnitude(&weights, f32::NAN).is_err());
    }

    #[test]
    fn test_idempotent_at_same_fraction() {
        let weights = Tensor::from_vec(vec![0.4, -0.1, 0.8, 0.05, -0.6, 0.2], false);
        let (pruned, mask) = prune_by_magnitude(&weights, 0.5).unwrap();
        let (repruned, mask2) = prune_by_magnitude(&pruned, 0.5).unwrap();

        assert_eq!(mask, mask2);
        assert_eq!(pruned.data(), repruned.data());
    }

    #[test]
    fn test_preserves_requires_grad_and_shape() {
        let weights = Tensor::with_shape(
            ndarray::Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0]),
            vec![2, 2],
            true,
        );
        let (pruned, mask) = prune_by_magnitude(&weights, 0.25).unwrap();
        assert!(pruned.requires_grad());
        assert_eq!(pruned.shape(), &[2, 2]);
        assert_eq!(mask.shape(), &[2, 2]);
    }
}
