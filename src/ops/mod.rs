//! Preprocessing operations
//!
//! Every operation is available three ways: as a free function, as a
//! method on [`Tensor`](crate::tensor::Tensor), and as a parameter struct
//! implementing [`Transform`], which also offers data-free shape inference.
//!
//! | Transform | Copies data | Notes |
//! |-----------|-------------|-------|
//! | [`ResizeOptions`] | yes | fixed-size nearest/bilinear/bicubic |
//! | [`ShortestEdge`] | yes | aspect-preserving resize |
//! | [`CenterCrop`] | no | narrows the spatial axes |
//! | [`Normalize`] | yes | per-channel `(x - mean) / std`, float only |
//! | [`Rescale`] | yes | constant multiply, integer input becomes `F32` |
//! | [`Cast`] | yes | round and clamp into integer targets |
//! | [`ToChannelsFirst`] / [`ToChannelsLast`] | no | HWC <-> CHW permutes |
//! | [`AddBatchDim`] | no | `unsqueeze(0)` |
//! | [`Reshape`] | no | contiguous input, one `-1` wildcard |

mod convert;
mod crop;
mod normalize;
mod resize;
mod traits;

pub use convert::{
    permute_output_shape, reshape_output_shape, AddBatchDim, Cast, Reshape, ToChannelsFirst,
    ToChannelsLast,
};
pub use crop::{center_crop, center_crop_output_shape, CenterCrop};
pub use normalize::{Normalize, Rescale, IMAGENET_MEAN, IMAGENET_STD};
pub use resize::{
    resize, resize_output_shape, resize_shortest_edge, shortest_edge_size, InterpolationMode,
    ResizeOptions, ShortestEdge,
};
pub use traits::Transform;
