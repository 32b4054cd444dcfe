//! Shaped tensor with shared storage and an optional gradient cell

use super::backward::BackwardOp;
use ndarray::Array1;
use std::cell::{RefCell, RefMut};
use std::rc::Rc;

/// A tensor backed by flat `f32` storage plus an explicit shape.
///
/// Storage and gradient live behind `Rc<RefCell<..>>` so that clones alias
/// the same buffers: the training session, the optimizer, and the re-masking
/// pass all mutate the same parameter in place. Deliberately `!Send`: the
/// training loop is single-threaded and there is exactly one mutator.
#[derive(Clone)]
pub struct Tensor {
    data: Rc<RefCell<Array1<f32>>>,
    shape: Vec<usize>,
    grad: Rc<RefCell<Option<Array1<f32>>>>,
    requires_grad: bool,
    backward_op: Option<Rc<dyn BackwardOp>>,
}

impl Tensor {
    /// Create a 1-D tensor from flat data
    pub fn new(data: Array1<f32>, requires_grad: bool) -> Self {
        let shape = vec![data.len()];
        Self::with_shape(data, shape, requires_grad)
    }

    /// Create a tensor from flat data and an explicit shape.
    ///
    /// # Panics
    ///
    /// Panics if the shape's element count does not match the data length.
    pub fn with_shape(data: Array1<f32>, shape: Vec<usize>, requires_grad: bool) -> Self {
        assert_eq!(
            data.len(),
            shape.iter().product::<usize>(),
            "shape {shape:?} does not match data length {}",
            data.len()
        );
        Self {
            data: Rc::new(RefCell::new(data)),
            shape,
            grad: Rc::new(RefCell::new(None)),
            requires_grad,
            backward_op: None,
        }
    }

    /// Create a 1-D tensor from a `Vec`
    pub fn from_vec(data: Vec<f32>, requires_grad: bool) -> Self {
        Self::new(Array1::from_vec(data), requires_grad)
    }

    /// Create a zero-filled 1-D tensor
    pub fn zeros(len: usize, requires_grad: bool) -> Self {
        Self::new(Array1::zeros(len), requires_grad)
    }

    /// Snapshot of the underlying data
    pub fn data(&self) -> Array1<f32> {
        self.data.borrow().clone()
    }

    /// Mutable access to the underlying data
    pub fn data_mut(&self) -> RefMut<'_, Array1<f32>> {
        self.data.borrow_mut()
    }

    /// Tensor shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    /// True when the tensor holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether gradients are tracked for this tensor
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Snapshot of the accumulated gradient, if any
    pub fn grad(&self) -> Option<Array1<f32>> {
        self.grad.borrow().clone()
    }

    /// Shared handle to the gradient cell, for backward ops
    pub fn grad_cell(&self) -> Rc<RefCell<Option<Array1<f32>>>> {
        Rc::clone(&self.grad)
    }

    /// Replace the gradient
    pub fn set_grad(&mut self, grad: Array1<f32>) {
        *self.grad.borrow_mut() = Some(grad);
    }

    /// Add into the gradient, initializing it if absent
    pub fn accumulate_grad(&self, grad: Array1<f32>) {
        let mut cell = self.grad.borrow_mut();
        if let Some(existing) = cell.as_mut() {
            *existing = &*existing + &grad;
        } else {
            *cell = Some(grad);
        }
    }

    /// Clear the gradient
    pub fn zero_grad(&mut self) {
        *self.grad.borrow_mut() = None;
    }

    /// The op that produced this tensor, if it is part of a tape
    pub fn backward_op(&self) -> Option<Rc<dyn BackwardOp>> {
        self.backward_op.clone()
    }

    /// Attach the producing op
    pub fn set_backward_op(&mut self, op: Rc<dyn BackwardOp>) {
        self.backward_op = Some(op);
    }
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("requires_grad", &self.requires_grad)
            .field("data", &self.data.borrow())
            .finish()
    }
}
