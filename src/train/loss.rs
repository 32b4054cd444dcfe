//! Loss functions for fine-tuning

use crate::autograd::BackwardOp;
use crate::Tensor;
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Trait for loss functions
pub trait LossFn {
    /// Compute loss given predictions and targets.
    ///
    /// Returns a scalar loss tensor and sets up gradients for
    /// backpropagation into the predictions.
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor;

    /// Name of the loss function
    fn name(&self) -> &str;
}

/// Batched cross-entropy loss over logits.
///
/// Predictions are `[batch, classes]` logits flattened row-major, targets
/// one-hot rows of the same shape. The loss is the mean over rows of
/// `-sum(target * log(softmax(logits)))`.
///
/// # Example
///
/// ```
/// use podar::train::{CrossEntropyLoss, LossFn};
/// use podar::Tensor;
///
/// let loss_fn = CrossEntropyLoss::new(3);
/// let logits = Tensor::from_vec(vec![2.0, 1.0, 0.5], true);
/// let targets = Tensor::from_vec(vec![1.0, 0.0, 0.0], false);
///
/// let loss = loss_fn.forward(&logits, &targets);
/// assert!(loss.data()[0] > 0.0);
/// ```
pub struct CrossEntropyLoss {
    num_classes: usize,
}

impl CrossEntropyLoss {
    /// Create a cross-entropy loss over `num_classes` logits per row
    pub fn new(num_classes: usize) -> Self {
        assert!(num_classes > 0, "num_classes must be positive");
        Self { num_classes }
    }

    /// Compute softmax over one row of logits
    fn softmax(row: &[f32]) -> Vec<f32> {
        let max = row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let exp: Vec<f32> = row.iter().map(|&v| (v - max).exp()).collect();
        let sum: f32 = exp.iter().sum();
        exp.into_iter().map(|v| v / sum).collect()
    }
}

impl LossFn for CrossEntropyLoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        assert_eq!(
            predictions.len(),
            targets.len(),
            "predictions and targets must have same length"
        );
        assert_eq!(
            predictions.len() % self.num_classes,
            0,
            "predictions length must be a multiple of num_classes"
        );

        if predictions.is_empty() {
            return Tensor::from_vec(vec![0.0], true);
        }

        let pred_data = predictions.data();
        let target_data = targets.data();
        let rows = pred_data.len() / self.num_classes;

        let mut total = 0.0f32;
        let mut grad = Array1::<f32>::zeros(pred_data.len());

        for r in 0..rows {
            let lo = r * self.num_classes;
            let hi = lo + self.num_classes;
            let probs = Self::softmax(&pred_data.as_slice().unwrap()[lo..hi]);

            for (c, &p) in probs.iter().enumerate() {
                let t = target_data[lo + c];
                total += -t * (p + 1e-10).ln();
                // d(CE)/d(logits) = probs - targets, averaged over rows
                grad[lo + c] = (p - t) / rows as f32;
            }
        }

        let mut loss = Tensor::from_vec(vec![total / rows as f32], true);

        struct CeBackward {
            pred: Tensor,
            pred_grad_cell: Rc<RefCell<Option<Array1<f32>>>>,
            grad: Array1<f32>,
        }

        impl BackwardOp for CeBackward {
            fn backward(&self) {
                let mut pred_grad = self.pred_grad_cell.borrow_mut();
                if let Some(existing) = pred_grad.as_mut() {
                    *existing = &*existing + &self.grad;
                } else {
                    *pred_grad = Some(self.grad.clone());
                }
                drop(pred_grad);

                // Continue down the tape so gradients reach the parameters
                if let Some(op) = self.pred.backward_op() {
                    op.backward();
                }
            }
        }

        if predictions.requires_grad() {
            loss.set_backward_op(Rc::new(CeBackward {
                pred: predictions.clone(),
                pred_grad_cell: predictions.grad_cell(),
                grad,
            }));
        }

        loss
    }

    fn name(&self) -> &'static str {
        "CrossEntropy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::backward;
    use approx::assert_relative_eq;

    #[test]
    fn test_uniform_logits_loss_is_ln_classes() {
        let loss_fn = CrossEntropyLoss::new(4);
        let logits = Tensor::from_vec(vec![0.0; 4], true);
        let targets = Tensor::from_vec(vec![1.0, 0.0, 0.0, 0.0], false);

        let loss = loss_fn.forward(&logits, &targets);
        assert_relative_eq!(loss.data()[0], 4.0f32.ln(), epsilon = 1e-5);
    }

    #[test]
    fn test_confident_correct_prediction_low_loss() {
        let loss_fn = CrossEntropyLoss::new(2);
        let logits = Tensor::from_vec(vec![10.0, -10.0], true);
        let targets = Tensor::from_vec(vec![1.0, 0.0], false);

        let loss = loss_fn.forward(&logits, &targets);
        assert!(loss.data()[0] < 1e-3);
    }

    #[test]
    fn test_gradient_is_probs_minus_targets() {
        let loss_fn = CrossEntropyLoss::new(2);
        let logits = Tensor::from_vec(vec![0.0, 0.0], true);
        let targets = Tensor::from_vec(vec![1.0, 0.0], false);

        let mut loss = loss_fn.forward(&logits, &targets);
        backward(&mut loss, None);

        let grad = logits.grad().unwrap();
        assert_relative_eq!(grad[0], -0.5, epsilon = 1e-6);
        assert_relative_eq!(grad[1], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_batched_rows_average() {
        let loss_fn = CrossEntropyLoss::new(2);
        // Two rows, both uniform
        let logits = Tensor::from_vec(vec![0.0, 0.0, 0.0, 0.0], true);
        let targets = Tensor::from_vec(vec![1.0, 0.0, 0.0, 1.0], false);

        let mut loss = loss_fn.forward(&logits, &targets);
        assert_relative_eq!(loss.data()[0], 2.0f32.ln(), epsilon = 1e-5);

        backward(&mut loss, None);
        let grad = logits.grad().unwrap();
        // Per-row grad (probs - target) halved by the row average
        assert_relative_eq!(grad[0], -0.25, epsilon = 1e-6);
        assert_relative_eq!(grad[3], -0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_gradient_flows_to_parameters() {
        use crate::autograd::mul;

        let w = Tensor::from_vec(vec![1.0, 1.0], true);
        let x = Tensor::from_vec(vec![2.0, 3.0], false);
        let logits = mul(&w, &x);

        let loss_fn = CrossEntropyLoss::new(2);
        let targets = Tensor::from_vec(vec![0.0, 1.0], false);
        let mut loss = loss_fn.forward(&logits, &targets);
        backward(&mut loss, None);

        assert!(w.grad().is_some());
    }
}
