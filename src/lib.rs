//! # podar
//!
//! Magnitude-based weight pruning of convolutional classifiers, with
//! fine-tuning that preserves the pruning decision as a structural
//! invariant. Optionally augments training batches with watermark samples
//! so a provenance signal survives the fine-tuning.
//!
//! The pruning core is small and deliberate:
//!
//! - [`prune::prune_by_magnitude`] ranks a layer's weights by absolute
//!   value and zeroes the lowest `round(fraction * n)` of them, returning a
//!   pruned copy and its mask.
//! - [`prune::MaskRegistry`] records (address, mask) pairs for every target
//!   layer, is persisted with the model, and is replayed against the live
//!   weights after every optimizer step.
//! - [`train::TrainingSession`] runs the masked fine-tuning loop: pruned
//!   positions receive gradient, momentum, and weight-decay updates like
//!   any other weight, then the re-mask pass forces them back to exactly
//!   zero before the next step.
//!
//! # Example
//!
//! ```
//! use podar::prune::MaskRegistry;
//! use podar::Tensor;
//!
//! let mut params = vec![(
//!     "block1.conv2.weight".to_string(),
//!     Tensor::from_vec(vec![0.1, -0.9, 0.3, -0.2], true),
//! )];
//!
//! let plan = MaskRegistry::build(&params, "conv2", 0.5)?;
//! let registry = plan.commit(&mut params)?;
//!
//! assert_eq!(params[0].1.data().to_vec(), vec![0.0, -0.9, 0.3, 0.0]);
//! assert_eq!(registry.addresses(), vec!["block1.conv2.weight"]);
//! # Ok::<(), podar::Error>(())
//! ```

pub mod autograd;
pub mod cli;
pub mod io;
pub mod optim;
pub mod prune;
pub mod train;

mod error;

pub use autograd::Tensor;
pub use error::{Error, Result};
