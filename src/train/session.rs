//! Masked fine-tuning session

use super::batch::Batch;
use super::loss::{CrossEntropyLoss, LossFn};
use super::metrics::{Accuracy, MetricsTracker};
use super::watermark::WatermarkSet;
use crate::autograd::backward;
use crate::cli::logging::{log, LogLevel};
use crate::io::{CheckpointManager, ResultsFile};
use crate::optim::{Optimizer, SGD};
use crate::prune::MaskRegistry;
use crate::{Result, Tensor};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Session configuration: fine-tuning hyperparameters and reporting level
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Learning rate
    pub lr: f32,
    /// SGD momentum
    pub momentum: f32,
    /// L2 weight decay
    pub weight_decay: f32,
    /// Number of output classes
    pub num_classes: usize,
    /// Progress output level
    pub log_level: LogLevel,
    /// Seed for the per-epoch watermark offset; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lr: 0.01,
            momentum: 0.9,
            weight_decay: 5e-4,
            num_classes: 10,
            log_level: LogLevel::Normal,
            seed: None,
        }
    }
}

impl SessionConfig {
    /// Create a configuration with default hyperparameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the learning rate
    pub fn with_lr(mut self, lr: f32) -> Self {
        self.lr = lr;
        self
    }

    /// Set the number of output classes
    pub fn with_num_classes(mut self, num_classes: usize) -> Self {
        self.num_classes = num_classes;
        self
    }

    /// Set the progress output level
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Pin the watermark offset seed, for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Loss and accuracy for one completed pass
#[derive(Debug, Clone, Copy)]
pub struct EpochStats {
    /// Average loss across batches
    pub loss: f32,
    /// Top-1 accuracy across samples
    pub accuracy: f32,
}

/// Outcome of a full fine-tuning run
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Epochs completed
    pub epochs: usize,
    /// Best test accuracy observed
    pub best_acc: f32,
    /// Training loss of the final epoch
    pub final_train_loss: f32,
}

/// Fine-tuning session over a pruned model.
///
/// Owns all mutable training state explicitly: the named parameters, the
/// optimizer, the mask registry, the watermark set, and the epoch metrics.
/// The mask registry is validated against the parameters once at
/// construction and read-only afterwards.
///
/// Every training step runs forward → loss → backward → optimizer step →
/// re-mask. The optimizer updates all parameters unconditionally, pruned
/// positions included; the re-mask pass then forces pruned positions back to
/// exactly zero, so the pruning invariant holds at every step boundary.
pub struct TrainingSession {
    params: Vec<(String, Tensor)>,
    flat_params: Vec<Tensor>,
    optimizer: SGD,
    registry: MaskRegistry,
    watermark: Option<WatermarkSet>,
    loss_fn: CrossEntropyLoss,
    accuracy: Accuracy,
    metrics: MetricsTracker,
    config: SessionConfig,
    rng: StdRng,
    epoch: usize,
}

impl TrainingSession {
    /// Create a session over pruned parameters and their mask registry.
    ///
    /// Fails fast if any registered address is missing from the parameters
    /// or its mask shape no longer matches the live tensor.
    pub fn new(
        params: Vec<(String, Tensor)>,
        registry: MaskRegistry,
        config: SessionConfig,
    ) -> Result<Self> {
        registry.validate(&params)?;

        let flat_params = params.iter().map(|(_, t)| t.clone()).collect();
        let optimizer = SGD::new(config.lr, config.momentum, config.weight_decay);
        let loss_fn = CrossEntropyLoss::new(config.num_classes);
        let accuracy = Accuracy::new(config.num_classes);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            params,
            flat_params,
            optimizer,
            registry,
            watermark: None,
            loss_fn,
            accuracy,
            metrics: MetricsTracker::new(),
            config,
            rng,
            epoch: 0,
        })
    }

    /// Attach a watermark sample set for robustness fine-tuning
    pub fn with_watermark(mut self, watermark: WatermarkSet) -> Self {
        self.watermark = Some(watermark);
        self
    }

    /// The named parameters
    pub fn params(&self) -> &[(String, Tensor)] {
        &self.params
    }

    /// The mask registry
    pub fn registry(&self) -> &MaskRegistry {
        &self.registry
    }

    /// Epochs completed so far
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Run one training epoch over the supplied batches.
    ///
    /// `forward_fn` maps a batch of inputs to `[batch, classes]` logits; the
    /// model architecture stays the caller's concern.
    pub fn train_epoch<F, I>(&mut self, batches: I, forward_fn: F) -> Result<EpochStats>
    where
        F: Fn(&Tensor) -> Tensor,
        I: IntoIterator<Item = Batch>,
    {
        self.metrics.reset();

        let wm_offset = self
            .watermark
            .as_ref()
            .map(|wm| wm.draw_offset(&mut self.rng));

        for (batch_idx, batch) in batches.into_iter().enumerate() {
            let batch = match (&self.watermark, wm_offset) {
                (Some(wm), Some(offset)) => {
                    let wm_batch = wm.sample_batch(offset, batch_idx, self.config.num_classes);
                    batch.concat(&wm_batch)?
                }
                _ => batch,
            };

            self.optimizer.zero_grad(&mut self.flat_params);

            let predictions = forward_fn(&batch.inputs);
            let mut loss = self.loss_fn.forward(&predictions, &batch.targets);
            backward(&mut loss, None);

            // Unconditional update: pruned positions drift here...
            self.optimizer.step(&mut self.flat_params);
            // ...and are forced back to exactly zero before the next step.
            self.registry.apply(&self.params)?;

            let (correct, total) = self.accuracy.correct_total(&predictions, &batch.targets);
            self.metrics.update(loss.data()[0], correct, total);

            log(
                self.config.log_level,
                LogLevel::Verbose,
                &format!(
                    "batch {batch_idx}: loss {:.3} | acc {:.3}",
                    self.metrics.avg_loss(),
                    self.metrics.accuracy()
                ),
            );
        }

        self.epoch += 1;
        Ok(EpochStats {
            loss: self.metrics.avg_loss(),
            accuracy: self.metrics.accuracy(),
        })
    }

    /// Evaluate on the supplied batches without touching the weights
    pub fn evaluate<F, I>(&self, batches: I, forward_fn: F) -> Result<EpochStats>
    where
        F: Fn(&Tensor) -> Tensor,
        I: IntoIterator<Item = Batch>,
    {
        let mut metrics = MetricsTracker::new();

        for batch in batches {
            let predictions = forward_fn(&batch.inputs);
            let loss = self.loss_fn.forward(&predictions, &batch.targets);
            let (correct, total) = self.accuracy.correct_total(&predictions, &batch.targets);
            metrics.update(loss.data()[0], correct, total);
        }

        Ok(EpochStats {
            loss: metrics.avg_loss(),
            accuracy: metrics.accuracy(),
        })
    }

    /// Run the full fine-tuning loop: for each epoch, train, evaluate,
    /// checkpoint on improvement, and append to the result file.
    pub fn run<F, BT, BV, IT, IV>(
        &mut self,
        epochs: usize,
        train_fn: BT,
        test_fn: BV,
        forward_fn: F,
        checkpoints: &mut CheckpointManager,
        results: &ResultsFile,
    ) -> Result<RunSummary>
    where
        F: Fn(&Tensor) -> Tensor,
        BT: Fn() -> IT,
        BV: Fn() -> IV,
        IT: IntoIterator<Item = Batch>,
        IV: IntoIterator<Item = Batch>,
    {
        let mut final_train_loss = 0.0;

        for _ in 0..epochs {
            let epoch = self.epoch;
            log(
                self.config.log_level,
                LogLevel::Normal,
                &format!("epoch {epoch}"),
            );

            let train_stats = self.train_epoch(train_fn(), &forward_fn)?;
            final_train_loss = train_stats.loss;
            log(
                self.config.log_level,
                LogLevel::Normal,
                &format!(
                    "train: loss {:.3} | acc {:.3}",
                    train_stats.loss, train_stats.accuracy
                ),
            );

            let test_stats = self.evaluate(test_fn(), &forward_fn)?;
            log(
                self.config.log_level,
                LogLevel::Normal,
                &format!(
                    "test:  loss {:.3} | acc {:.3}",
                    test_stats.loss, test_stats.accuracy
                ),
            );

            let saved =
                checkpoints.maybe_save(&self.params, &self.registry, test_stats.accuracy, epoch)?;
            if saved {
                log(self.config.log_level, LogLevel::Normal, "saving checkpoint");
            }

            results.append(epoch, checkpoints.best_acc())?;
        }

        Ok(RunSummary {
            epochs,
            best_acc: checkpoints.best_acc(),
            final_train_loss,
        })
    }
}
