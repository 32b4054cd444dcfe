//! Evaluation metrics and per-epoch bookkeeping

use crate::Tensor;

/// Trait for evaluation metrics
pub trait Metric {
    /// Compute the metric given predictions and targets
    fn compute(&self, predictions: &Tensor, targets: &Tensor) -> f32;

    /// Name of the metric
    fn name(&self) -> &str;
}

/// Top-1 accuracy over `[batch, classes]` logits against one-hot targets
#[derive(Debug, Clone)]
pub struct Accuracy {
    num_classes: usize,
}

impl Accuracy {
    /// Create a top-1 accuracy metric over `num_classes` logits per row
    pub fn new(num_classes: usize) -> Self {
        assert!(num_classes > 0, "num_classes must be positive");
        Self { num_classes }
    }

    /// Count (correct, total) rows where argmax(pred) == argmax(target)
    pub fn correct_total(&self, predictions: &Tensor, targets: &Tensor) -> (usize, usize) {
        assert_eq!(
            predictions.len(),
            targets.len(),
            "predictions and targets must have same length"
        );

        let preds = predictions.data();
        let targs = targets.data();
        let rows = preds.len() / self.num_classes;

        let mut correct = 0;
        for r in 0..rows {
            let lo = r * self.num_classes;
            let hi = lo + self.num_classes;
            let p = argmax(&preds.as_slice().unwrap()[lo..hi]);
            let t = argmax(&targs.as_slice().unwrap()[lo..hi]);
            if p == t {
                correct += 1;
            }
        }
        (correct, rows)
    }
}

impl Metric for Accuracy {
    fn compute(&self, predictions: &Tensor, targets: &Tensor) -> f32 {
        let (correct, total) = self.correct_total(predictions, targets);
        if total == 0 {
            0.0
        } else {
            correct as f32 / total as f32
        }
    }

    fn name(&self) -> &'static str {
        "Accuracy"
    }
}

/// First index of the maximum value; ties resolve to the lowest index
fn argmax(row: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }
    best
}

/// Running loss and accuracy for one epoch, reset at epoch start.
///
/// Progress reporting only; never part of the training contract.
#[derive(Debug, Clone, Default)]
pub struct MetricsTracker {
    total_loss: f32,
    batches: usize,
    correct: usize,
    total: usize,
}

impl MetricsTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all counters at epoch start
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record one batch's loss and top-1 counts
    pub fn update(&mut self, loss: f32, correct: usize, total: usize) {
        self.total_loss += loss;
        self.batches += 1;
        self.correct += correct;
        self.total += total;
    }

    /// Running loss average across recorded batches
    pub fn avg_loss(&self) -> f32 {
        if self.batches == 0 {
            0.0
        } else {
            self.total_loss / self.batches as f32
        }
    }

    /// Running top-1 accuracy across recorded samples
    pub fn accuracy(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f32 / self.total as f32
        }
    }

    /// Batches recorded this epoch
    pub fn batches(&self) -> usize {
        self.batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_all_correct() {
        let acc = Accuracy::new(2);
        let preds = Tensor::from_vec(vec![0.9, 0.1, 0.2, 0.8], false);
        let targets = Tensor::from_vec(vec![1.0, 0.0, 0.0, 1.0], false);
        assert_eq!(acc.compute(&preds, &targets), 1.0);
    }

    #[test]
    fn test_accuracy_half_correct() {
        let acc = Accuracy::new(2);
        let preds = Tensor::from_vec(vec![0.9, 0.1, 0.9, 0.1], false);
        let targets = Tensor::from_vec(vec![1.0, 0.0, 0.0, 1.0], false);
        assert_eq!(acc.compute(&preds, &targets), 0.5);
    }

    #[test]
    fn test_accuracy_empty() {
        let acc = Accuracy::new(2);
        let preds = Tensor::from_vec(vec![], false);
        let targets = Tensor::from_vec(vec![], false);
        assert_eq!(acc.compute(&preds, &targets), 0.0);
    }

    #[test]
    fn test_argmax_tie_resolves_low_index() {
        assert_eq!(argmax(&[0.5, 0.5, 0.1]), 0);
    }

    #[test]
    fn test_tracker_running_averages() {
        let mut tracker = MetricsTracker::new();
        tracker.update(1.0, 8, 10);
        tracker.update(0.5, 9, 10);

        assert_eq!(tracker.avg_loss(), 0.75);
        assert_eq!(tracker.accuracy(), 0.85);
        assert_eq!(tracker.batches(), 2);

        tracker.reset();
        assert_eq!(tracker.avg_loss(), 0.0);
        assert_eq!(tracker.accuracy(), 0.0);
    }
}
