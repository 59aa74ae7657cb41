//! Tensor types and operations
//!
//! This module provides the `Tensor` view type and the pieces it is built
//! from: a reference-counted typed [`Storage`], and a [`Layout`] holding the
//! shape, strides, and base offset that address it.

mod core;
mod layout;
mod shape;
mod storage;
mod strides;

pub use core::{infer_reshape, Tensor};
pub use layout::{
    inverse_permutation, is_contiguous, validate_permutation, Layout, MemoryFormat,
    StridedOffsets,
};
pub use shape::Shape;
pub use storage::{Buffer, Storage};
pub use strides::Strides;
