//! Checkpoint persistence
//!
//! A checkpoint is the composite record {weights-by-name, accuracy, epoch}
//! plus, once pruning has happened, the parallel address/mask lists of the
//! registry. Loading a pruned checkpoint reconstructs an equivalent
//! registry to the one that produced it.

use crate::prune::{MaskRegistry, PruneMask};
use crate::{Error, Result, Tensor};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// One named weight tensor in serialized form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightRecord {
    /// Parameter name
    pub name: String,
    /// Tensor shape
    pub shape: Vec<usize>,
    /// Flattened row-major values
    pub data: Vec<f32>,
}

/// Serialized model snapshot with training metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Named weight tensors
    pub weights: Vec<WeightRecord>,
    /// Test accuracy at save time
    pub acc: f32,
    /// Epoch at save time
    pub epoch: usize,
    /// Registered prune addresses, parallel to `masks`
    #[serde(default)]
    pub addresses: Vec<String>,
    /// Prune masks, parallel to `addresses`
    #[serde(default)]
    pub masks: Vec<PruneMask>,
}

impl Checkpoint {
    /// Snapshot live parameters and an optional registry
    pub fn from_params(
        params: &[(String, Tensor)],
        registry: Option<&MaskRegistry>,
        acc: f32,
        epoch: usize,
    ) -> Self {
        let weights = params
            .iter()
            .map(|(name, tensor)| WeightRecord {
                name: name.clone(),
                shape: tensor.shape().to_vec(),
                data: tensor.data().to_vec(),
            })
            .collect();

        let (addresses, masks) = registry.map(MaskRegistry::to_parts).unwrap_or_default();

        Self {
            weights,
            acc,
            epoch,
            addresses,
            masks,
        }
    }

    /// Materialize the stored weights as live, grad-tracking tensors
    pub fn params(&self) -> Vec<(String, Tensor)> {
        self.weights
            .iter()
            .map(|record| {
                (
                    record.name.clone(),
                    Tensor::with_shape(
                        Array1::from_vec(record.data.clone()),
                        record.shape.clone(),
                        true,
                    ),
                )
            })
            .collect()
    }

    /// Reconstruct the mask registry stored with this checkpoint.
    ///
    /// Returns an empty registry for a checkpoint saved before pruning.
    pub fn registry(&self) -> Result<MaskRegistry> {
        MaskRegistry::from_parts(self.addresses.clone(), self.masks.clone())
    }

    /// True once prune masks are stored
    pub fn is_pruned(&self) -> bool {
        !self.masks.is_empty()
    }
}

/// Load a checkpoint. A missing file is a fatal configuration error.
pub fn load_checkpoint(path: impl AsRef<Path>) -> Result<Checkpoint> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::Config(format!(
            "no checkpoint found at {}",
            path.display()
        )));
    }

    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader)
        .map_err(|e| Error::Serialization(format!("checkpoint decode failed: {e}")))
}

/// Write a checkpoint, creating parent directories as needed
pub fn save_checkpoint(checkpoint: &Checkpoint, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, checkpoint)
        .map_err(|e| Error::Serialization(format!("checkpoint encode failed: {e}")))
}

/// Persists the best-accuracy model state across a training run.
///
/// One fixed filename per model identifier; each save overwrites the
/// previous best. Tracks the best accuracy in memory.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
    model_id: String,
    best_acc: f32,
}

impl CheckpointManager {
    /// Create a manager writing under `dir` for the given model identifier
    pub fn new(dir: impl Into<PathBuf>, model_id: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            model_id: model_id.into(),
            best_acc: 0.0,
        }
    }

    /// Resume with a previously recorded best accuracy
    pub fn with_best_acc(mut self, best_acc: f32) -> Self {
        self.best_acc = best_acc;
        self
    }

    /// The fixed checkpoint path for this model identifier
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("pruned-{}-ckpt.json", self.model_id))
    }

    /// Best test accuracy seen so far in this run
    pub fn best_acc(&self) -> f32 {
        self.best_acc
    }

    /// Save a checkpoint if `acc` beats the best seen so far.
    ///
    /// Returns whether a checkpoint was written.
    pub fn maybe_save(
        &mut self,
        params: &[(String, Tensor)],
        registry: &MaskRegistry,
        acc: f32,
        epoch: usize,
    ) -> Result<bool> {
        if acc <= self.best_acc {
            return Ok(false);
        }

        let checkpoint = Checkpoint::from_params(params, Some(registry), acc, epoch);
        save_checkpoint(&checkpoint, self.path())?;
        self.best_acc = acc;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prune::MaskRegistry;

    fn pruned_fixture() -> (Vec<(String, Tensor)>, MaskRegistry) {
        let mut params = vec![
            (
                "block1.conv2.weight".to_string(),
                Tensor::from_vec(vec![0.1, -0.9, 0.3, -0.2], true),
            ),
            (
                "fc.weight".to_string(),
                Tensor::from_vec(vec![1.0, 2.0], true),
            ),
        ];
        let plan = MaskRegistry::build(&params, "conv2", 0.5).unwrap();
        let registry = plan.commit(&mut params).unwrap();
        (params, registry)
    }

    #[test]
    fn test_missing_checkpoint_is_config_error() {
        let err = load_checkpoint("/nonexistent/ckpt.json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_round_trip_reconstructs_registry() {
        let (params, registry) = pruned_fixture();
        let checkpoint = Checkpoint::from_params(&params, Some(&registry), 91.3, 7);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ckpt.json");
        save_checkpoint(&checkpoint, &path).unwrap();

        let loaded = load_checkpoint(&path).unwrap();
        assert_eq!(loaded.acc, 91.3);
        assert_eq!(loaded.epoch, 7);
        assert!(loaded.is_pruned());

        let rebuilt = loaded.registry().unwrap();
        assert_eq!(rebuilt, registry);

        // Reloaded weights still satisfy the masks
        let reloaded_params = loaded.params();
        rebuilt.validate(&reloaded_params).unwrap();
        for (address, mask) in rebuilt.iter() {
            let (_, weight) = reloaded_params
                .iter()
                .find(|(name, _)| name == address)
                .unwrap();
            assert!(mask.is_enforced(weight));
        }
    }

    #[test]
    fn test_unpruned_checkpoint_has_empty_registry() {
        let params = vec![(
            "fc.weight".to_string(),
            Tensor::from_vec(vec![1.0, 2.0], true),
        )];
        let checkpoint = Checkpoint::from_params(&params, None, 0.0, 0);
        assert!(!checkpoint.is_pruned());
        assert!(checkpoint.registry().unwrap().is_empty());
    }

    #[test]
    fn test_manager_saves_only_on_improvement() {
        let (params, registry) = pruned_fixture();
        let dir = tempfile::tempdir().unwrap();
        let mut manager = CheckpointManager::new(dir.path(), "res18");

        assert!(manager.maybe_save(&params, &registry, 50.0, 0).unwrap());
        assert_eq!(manager.best_acc(), 50.0);

        // No improvement, no write
        assert!(!manager.maybe_save(&params, &registry, 50.0, 1).unwrap());
        assert!(!manager.maybe_save(&params, &registry, 40.0, 2).unwrap());

        assert!(manager.maybe_save(&params, &registry, 60.0, 3).unwrap());
        assert_eq!(manager.best_acc(), 60.0);

        let loaded = load_checkpoint(manager.path()).unwrap();
        assert_eq!(loaded.acc, 60.0);
        assert_eq!(loaded.epoch, 3);
    }

    #[test]
    fn test_manager_path_is_fixed_per_model() {
        let manager = CheckpointManager::new("/tmp/ckpt", "vgg");
        assert_eq!(
            manager.path(),
            PathBuf::from("/tmp/ckpt/pruned-vgg-ckpt.json")
        );
    }
}
