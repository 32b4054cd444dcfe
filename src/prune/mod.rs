//! Magnitude pruning primitives
//!
//! This module implements the pruning core:
//!
//! - **Weight Selector**: pure magnitude-ranked keep/prune mask computation
//! - **Mask Registry**: ordered (address, mask) pairs persisted with the
//!   model and replayed after every optimizer step
//!
//! Pruning is a two-phase operation: [`MaskRegistry::build`] computes masks
//! and pruned tensors without touching the model, and [`PrunePlan::commit`]
//! writes them into the live parameters. The split keeps the selector pure
//! and gives callers a dry-run path.
//!
//! # Example
//!
//! ```
//! use podar::prune::prune_by_magnitude;
//! use podar::Tensor;
//!
//! let weights = Tensor::from_vec(vec![0.1, -0.9, 0.3, -0.2], false);
//! let (pruned, mask) = prune_by_magnitude(&weights, 0.5).unwrap();
//!
//! assert_eq!(mask.values(), &[0.0, 1.0, 1.0, 0.0]);
//! assert_eq!(pruned.data().to_vec(), vec![0.0, -0.9, 0.3, 0.0]);
//! ```
//!
//! # References
//!
//! - Han, S., et al. (2015). Learning both weights and connections. NeurIPS.

mod mask;
mod registry;
mod selector;

pub use mask::PruneMask;
pub use registry::{LayerPruneStats, MaskRegistry, PrunePlan};
pub use selector::prune_by_magnitude;
