//! Host compute kernels
//!
//! Kernels are plain generic functions over [`Element`](crate::dtype::Element)
//! slices. Dtype resolution happens once in the calling operation through
//! [`dispatch_buffer!`](crate::dispatch_buffer), so nothing in here branches
//! on a runtime dtype.

pub mod interpolate;
pub mod memory;

pub use interpolate::{resize_planes, source_coordinate, AxisTaps};
pub use memory::{cast_kernel, gather_strided};
