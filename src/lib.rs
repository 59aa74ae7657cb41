//! # pixr
//!
//! **Strided tensor views and resampling kernels for image preprocessing.**
//!
//! pixr turns pixel buffers into the numeric layouts inference runtimes
//! expect: resize, crop, normalize, cast, and reorder channels, without
//! copying data where a stride change is enough.
//!
//! ## Core ideas
//!
//! - **Typed storage**: one reference-counted buffer of one of ten scalar
//!   types, with round-and-clamp narrowing on write
//! - **Views**: shape, strides, and offset over shared storage; permute,
//!   squeeze, unsqueeze, reshape, and narrow never touch element data
//! - **Copy-on-write**: the explicitly in-place operations detach a view
//!   from storage it shares before writing
//! - **Kernels**: nearest, bilinear, and bicubic resampling per channel plane
//!
//! ## Quick Start
//!
//! ```
//! use pixr::prelude::*;
//!
//! // An 8x6 RGB image in HWC order, as decoded from a file
//! let pixels: Vec<u8> = (0..8 * 6 * 3).map(|v| v as u8).collect();
//! let image = Tensor::from_vec(pixels, &[8, 6, 3])?;
//!
//! let chw = ToChannelsFirst.apply(&image)?.contiguous();
//! let resized = chw.resize(&ResizeOptions::new(4, 4)?)?;
//! let scaled = resized.rescale(1.0 / 255.0)?;
//! let input = scaled.normalize(&Normalize::default())?.unsqueeze(0)?;
//!
//! assert_eq!(input.shape(), &[1, 3, 4, 4]);
//! assert_eq!(input.dtype(), DType::F32);
//! # Ok::<(), pixr::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` for dtypes and transform parameters

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

mod dispatch;

pub mod dtype;
pub mod error;
pub mod kernels;
pub mod ops;
pub mod tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::ops::{
        AddBatchDim, Cast, CenterCrop, InterpolationMode, Normalize, Rescale, Reshape,
        ResizeOptions, ShortestEdge, ToChannelsFirst, ToChannelsLast, Transform,
    };
    pub use crate::tensor::{Buffer, Layout, MemoryFormat, Shape, Storage, Tensor};
}
