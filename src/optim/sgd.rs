//! Stochastic Gradient Descent optimizer

use super::Optimizer;
use crate::Tensor;
use ndarray::Array1;

/// SGD with momentum and L2 weight decay folded into the gradient.
///
/// The update is applied unconditionally to every parameter that carries a
/// gradient. Pruned positions are updated like any other and rely on the
/// post-step re-masking pass to return to zero.
pub struct SGD {
    lr: f32,
    momentum: f32,
    weight_decay: f32,
    velocities: Vec<Option<Array1<f32>>>,
}

impl SGD {
    /// Create a new SGD optimizer
    pub fn new(lr: f32, momentum: f32, weight_decay: f32) -> Self {
        Self {
            lr,
            momentum,
            weight_decay,
            velocities: Vec::new(),
        }
    }

    /// Momentum coefficient
    pub fn momentum(&self) -> f32 {
        self.momentum
    }

    /// Weight decay coefficient
    pub fn weight_decay(&self) -> f32 {
        self.weight_decay
    }

    /// Initialize velocities if needed
    fn ensure_velocities(&mut self, params: &[Tensor]) {
        if self.velocities.is_empty() {
            self.velocities = params.iter().map(|_| None).collect();
        }
    }
}

impl Optimizer for SGD {
    fn step(&mut self, params: &mut [Tensor]) {
        self.ensure_velocities(params);

        for (i, param) in params.iter_mut().enumerate() {
            if let Some(grad) = param.grad() {
                // L2 penalty folds into the gradient, as in classic SGD
                let grad = if self.weight_decay > 0.0 {
                    &grad + &(param.data() * self.weight_decay)
                } else {
                    grad
                };

                if self.momentum > 0.0 {
                    // v = momentum * v - lr * grad
                    let velocity = if let Some(v) = &self.velocities[i] {
                        v * self.momentum - &grad * self.lr
                    } else {
                        &grad * (-self.lr)
                    };

                    *param.data_mut() = param.data() + &velocity;
                    self.velocities[i] = Some(velocity);
                } else {
                    // param -= lr * grad
                    *param.data_mut() = param.data() - &(&grad * self.lr);
                }
            }
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plain_sgd_step() {
        let mut opt = SGD::new(0.1, 0.0, 0.0);
        let mut params = vec![Tensor::from_vec(vec![1.0, 2.0], true)];
        params[0].accumulate_grad(Array1::from_vec(vec![1.0, 1.0]));

        opt.step(&mut params);

        let data = params[0].data();
        assert_relative_eq!(data[0], 0.9);
        assert_relative_eq!(data[1], 1.9);
    }

    #[test]
    fn test_momentum_accumulates_across_steps() {
        let mut opt = SGD::new(0.1, 0.9, 0.0);
        let mut params = vec![Tensor::from_vec(vec![1.0], true)];

        params[0].accumulate_grad(Array1::from_vec(vec![1.0]));
        opt.step(&mut params);
        // first step: v = -0.1, w = 0.9
        assert_relative_eq!(params[0].data()[0], 0.9);

        params[0].zero_grad();
        params[0].accumulate_grad(Array1::from_vec(vec![1.0]));
        opt.step(&mut params);
        // second step: v = 0.9 * -0.1 - 0.1 = -0.19, w = 0.71
        assert_relative_eq!(params[0].data()[0], 0.71, epsilon = 1e-6);
    }

    #[test]
    fn test_weight_decay_shrinks_even_with_zero_grad() {
        let mut opt = SGD::new(0.1, 0.0, 0.5);
        let mut params = vec![Tensor::from_vec(vec![2.0], true)];
        params[0].accumulate_grad(Array1::from_vec(vec![0.0]));

        opt.step(&mut params);

        // grad = 0 + 0.5 * 2.0 = 1.0, w = 2.0 - 0.1 = 1.9
        assert_relative_eq!(params[0].data()[0], 1.9);
    }

    #[test]
    fn test_no_grad_no_update() {
        let mut opt = SGD::new(0.1, 0.9, 0.5);
        let mut params = vec![Tensor::from_vec(vec![3.0], true)];

        opt.step(&mut params);
        assert_eq!(params[0].data()[0], 3.0);
    }
}
