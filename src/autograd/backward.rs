//! Backward op trait for the gradient tape

/// An operation recorded on the tape that knows how to propagate gradients
/// to its inputs.
pub trait BackwardOp {
    /// Propagate the output gradient to the op's inputs, recursing into
    /// their producing ops.
    fn backward(&self);
}
