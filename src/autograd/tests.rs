//! Autograd engine tests

use super::*;
use ndarray::Array1;

#[test]
fn test_add_forward() {
    let a = Tensor::from_vec(vec![1.0, 2.0], false);
    let b = Tensor::from_vec(vec![3.0, 4.0], false);
    let c = add(&a, &b);
    assert_eq!(c.data().to_vec(), vec![4.0, 6.0]);
    assert!(!c.requires_grad());
}

#[test]
fn test_mul_forward() {
    let a = Tensor::from_vec(vec![2.0, 3.0], false);
    let b = Tensor::from_vec(vec![4.0, 5.0], false);
    let c = mul(&a, &b);
    assert_eq!(c.data().to_vec(), vec![8.0, 15.0]);
}

#[test]
fn test_mul_backward_to_both_inputs() {
    let a = Tensor::from_vec(vec![2.0, 3.0], true);
    let b = Tensor::from_vec(vec![4.0, 5.0], true);
    let mut c = mul(&a, &b);

    backward(&mut c, None);

    // ∂(a*b)/∂a = b, ∂(a*b)/∂b = a
    assert_eq!(a.grad().unwrap().to_vec(), vec![4.0, 5.0]);
    assert_eq!(b.grad().unwrap().to_vec(), vec![2.0, 3.0]);
}

#[test]
fn test_add_backward_passes_grad_through() {
    let a = Tensor::from_vec(vec![1.0, 1.0], true);
    let b = Tensor::from_vec(vec![2.0, 2.0], true);
    let mut c = add(&a, &b);

    backward(&mut c, Some(Array1::from_vec(vec![0.5, 1.5])));

    assert_eq!(a.grad().unwrap().to_vec(), vec![0.5, 1.5]);
    assert_eq!(b.grad().unwrap().to_vec(), vec![0.5, 1.5]);
}

#[test]
fn test_chained_ops_reach_leaf() {
    // out = (w * x) + b, grads must reach w and b through the chain
    let w = Tensor::from_vec(vec![2.0, 2.0], true);
    let x = Tensor::from_vec(vec![3.0, 4.0], false);
    let b = Tensor::from_vec(vec![1.0, 1.0], true);

    let mut out = add(&mul(&w, &x), &b);
    backward(&mut out, None);

    assert_eq!(w.grad().unwrap().to_vec(), vec![3.0, 4.0]);
    assert_eq!(b.grad().unwrap().to_vec(), vec![1.0, 1.0]);
    assert!(x.grad().is_none());
}
