//! Common test utilities
#![allow(dead_code)]

use pixr::dtype::Element;
use pixr::tensor::Tensor;

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Row-major tensor holding `0, 1, 2, ...` converted to `T`
pub fn arange<T: Element>(shape: &[usize]) -> Tensor {
    let n: usize = shape.iter().product();
    let data: Vec<T> = (0..n).map(|v| T::from_f64(v as f64)).collect();
    Tensor::from_vec(data, shape).unwrap()
}

/// Every index tuple of `shape` in row-major order
pub fn indices(shape: &[usize]) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut idx = vec![0usize; shape.len()];
    let total: usize = shape.iter().product();
    for _ in 0..total {
        out.push(idx.clone());
        for d in (0..shape.len()).rev() {
            idx[d] += 1;
            if idx[d] < shape[d] {
                break;
            }
            idx[d] = 0;
        }
    }
    out
}

/// All permutations of `0..n` (Heap's algorithm)
pub fn permutations(n: usize) -> Vec<Vec<usize>> {
    fn heap(k: usize, perm: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if k <= 1 {
            out.push(perm.clone());
            return;
        }
        for i in 0..k {
            heap(k - 1, perm, out);
            let j = if k % 2 == 0 { i } else { 0 };
            perm.swap(j, k - 1);
        }
    }
    let mut perm: Vec<usize> = (0..n).collect();
    let mut out = Vec::new();
    heap(n, &mut perm, &mut out);
    out
}
