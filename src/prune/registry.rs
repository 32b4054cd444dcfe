//! Mask registry: the persisted record of which weights were pruned

use super::mask::PruneMask;
use super::selector::prune_by_magnitude;
use crate::{Error, Result, Tensor};
use serde::{Deserialize, Serialize};

/// Per-layer pruning report, used for progress output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerPruneStats {
    /// Parameter name
    pub address: String,
    /// Total weights in the layer
    pub total: usize,
    /// Weights forced to zero
    pub pruned: usize,
}

/// Ordered list of (address, mask) pairs.
///
/// Built once at prune time over the model's parameters in their natural
/// enumeration order, read-only afterwards, and persisted alongside the
/// weights so a reloaded checkpoint reconstructs the same registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaskRegistry {
    entries: Vec<(String, PruneMask)>,
}

/// The output of [`MaskRegistry::build`]: masks plus pruned replacement
/// tensors, not yet written into the model. `commit` performs the in-place
/// replacement; dropping the plan leaves the model untouched (dry run).
#[derive(Debug)]
pub struct PrunePlan {
    registry: MaskRegistry,
    pruned: Vec<(String, Tensor)>,
    stats: Vec<LayerPruneStats>,
}

impl MaskRegistry {
    /// Compute masks for every parameter whose name contains `marker`,
    /// using a single global prune fraction.
    ///
    /// Parameters are visited in their given order, so the registry order is
    /// reproducible for the same model. The model is not modified.
    pub fn build(params: &[(String, Tensor)], marker: &str, fraction: f32) -> Result<PrunePlan> {
        let mut registry = MaskRegistry::default();
        let mut pruned = Vec::new();
        let mut stats = Vec::new();

        for (name, weight) in params {
            if !name.contains(marker) {
                continue;
            }

            let (replacement, mask) = prune_by_magnitude(weight, fraction)?;
            stats.push(LayerPruneStats {
                address: name.clone(),
                total: mask.len(),
                pruned: mask.pruned_count(),
            });
            registry.entries.push((name.clone(), mask));
            pruned.push((name.clone(), replacement));
        }

        Ok(PrunePlan {
            registry,
            pruned,
            stats,
        })
    }

    /// Reassemble a registry from the parallel address/mask lists stored in
    /// a checkpoint.
    pub fn from_parts(addresses: Vec<String>, masks: Vec<PruneMask>) -> Result<Self> {
        if addresses.len() != masks.len() {
            return Err(Error::Config(format!(
                "checkpoint has {} addresses but {} masks",
                addresses.len(),
                masks.len()
            )));
        }
        Ok(Self {
            entries: addresses.into_iter().zip(masks).collect(),
        })
    }

    /// Split into parallel address/mask lists for checkpoint storage
    pub fn to_parts(&self) -> (Vec<String>, Vec<PruneMask>) {
        let addresses = self.entries.iter().map(|(a, _)| a.clone()).collect();
        let masks = self.entries.iter().map(|(_, m)| m.clone()).collect();
        (addresses, masks)
    }

    /// Registered addresses, in registry order
    pub fn addresses(&self) -> Vec<&str> {
        self.entries.iter().map(|(a, _)| a.as_str()).collect()
    }

    /// Number of registered layers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no layer is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate (address, mask) pairs in registry order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PruneMask)> {
        self.entries.iter().map(|(a, m)| (a.as_str(), m))
    }

    /// Check every registered address against the live parameter list:
    /// the address must exist and its tensor must match the mask shape.
    ///
    /// Called once at session startup so a model edited after pruning fails
    /// fast instead of drifting or broadcasting.
    pub fn validate(&self, params: &[(String, Tensor)]) -> Result<()> {
        for (address, mask) in &self.entries {
            let weight = params
                .iter()
                .find(|(name, _)| name == address)
                .map(|(_, t)| t)
                .ok_or_else(|| {
                    Error::Config(format!("registered address '{address}' not found in model"))
                })?;

            if mask.shape() != weight.shape() {
                return Err(Error::ShapeMismatch {
                    address: address.clone(),
                    mask: mask.shape().to_vec(),
                    weight: weight.shape().to_vec(),
                });
            }
        }
        Ok(())
    }

    /// Re-mask pass: overwrite every registered weight with `weight ⊙ mask`,
    /// forcing pruned positions back to exactly zero.
    ///
    /// Runs immediately after each optimizer step; without it, weight decay
    /// and momentum would pull pruned weights away from zero.
    pub fn apply(&self, params: &[(String, Tensor)]) -> Result<()> {
        for (address, mask) in &self.entries {
            let weight = params
                .iter()
                .find(|(name, _)| name == address)
                .map(|(_, t)| t)
                .ok_or_else(|| {
                    Error::Config(format!("registered address '{address}' not found in model"))
                })?;
            mask.apply(address, weight)?;
        }
        Ok(())
    }
}

impl PrunePlan {
    /// The registry the plan would install
    pub fn registry(&self) -> &MaskRegistry {
        &self.registry
    }

    /// Per-layer pruning report
    pub fn stats(&self) -> &[LayerPruneStats] {
        &self.stats
    }

    /// Total weights pruned across all selected layers
    pub fn total_pruned(&self) -> usize {
        self.stats.iter().map(|s| s.pruned).sum()
    }

    /// Write the pruned tensors into the live parameters and hand over the
    /// registry. Tensor identity is preserved: data is overwritten in place
    /// so existing aliases (optimizer, session) observe the pruned values.
    pub fn commit(self, params: &mut [(String, Tensor)]) -> Result<MaskRegistry> {
        for (address, replacement) in &self.pruned {
            let weight = params
                .iter()
                .find(|(name, _)| name == address)
                .map(|(_, t)| t)
                .ok_or_else(|| {
                    Error::Config(format!("planned address '{address}' not found in model"))
                })?;
            *weight.data_mut() = replacement.data();
        }
        Ok(self.registry)
    }
}
