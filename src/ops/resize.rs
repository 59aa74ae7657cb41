//! Fixed-size and shortest-edge resizing of channels-first images

use super::traits::Transform;
use crate::dispatch_dtype;
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::kernels::resize_planes;
use crate::tensor::{Shape, Tensor};
use std::fmt;
use tracing::debug;

/// Resampling method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum InterpolationMode {
    /// Copy the source pixel at `floor(dst * src / dst_size)`
    Nearest,
    /// Weighted 2x2 neighbourhood
    #[default]
    Bilinear,
    /// Cubic convolution over a 4x4 neighbourhood (`a = -0.5`)
    Bicubic,
}

impl InterpolationMode {
    /// Source taps read per axis for one destination coordinate
    pub const fn taps(self) -> usize {
        match self {
            Self::Nearest => 1,
            Self::Bilinear => 2,
            Self::Bicubic => 4,
        }
    }

    /// Lowercase name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
            Self::Bicubic => "bicubic",
        }
    }
}

impl fmt::Display for InterpolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target size and sampling parameters for a fixed-size resize
///
/// # Example
///
/// ```
/// # use pixr::prelude::*;
/// let options = ResizeOptions::new(224, 224)?
///     .with_mode(InterpolationMode::Bicubic)
///     .with_align_corners(true);
/// assert_eq!(options.output_shape(&[3, 480, 640])?, [3, 224, 224]);
/// # Ok::<(), pixr::error::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResizeOptions {
    /// Output height
    pub height: usize,
    /// Output width
    pub width: usize,
    /// Resampling method
    pub mode: InterpolationMode,
    /// Corner-aligned instead of half-pixel-center coordinate mapping
    pub align_corners: bool,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            height: 224,
            width: 224,
            mode: InterpolationMode::Bilinear,
            align_corners: false,
        }
    }
}

impl ResizeOptions {
    /// Bilinear, half-pixel-center resize to `height x width`
    pub fn new(height: usize, width: usize) -> Result<Self> {
        let options = Self {
            height,
            width,
            ..Self::default()
        };
        options.validate()?;
        Ok(options)
    }

    /// Set the resampling method
    pub fn with_mode(mut self, mode: InterpolationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the coordinate mapping
    pub fn with_align_corners(mut self, align_corners: bool) -> Self {
        self.align_corners = align_corners;
        self
    }

    /// Check that both target dimensions are positive
    pub fn validate(&self) -> Result<()> {
        if self.height == 0 {
            return Err(Error::invalid_parameter("height", self.height, "must be positive"));
        }
        if self.width == 0 {
            return Err(Error::invalid_parameter("width", self.width, "must be positive"));
        }
        Ok(())
    }
}

impl Transform for ResizeOptions {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn output_shape(&self, input: &[usize]) -> Result<Shape> {
        self.validate()?;
        resize_output_shape(input, self.height, self.width)
    }

    fn apply(&self, input: &Tensor) -> Result<Tensor> {
        resize(input, self)
    }
}

/// Aspect-preserving resize driven by the shorter image edge
///
/// The shorter edge is scaled to `size`; if `max_size` is set and the
/// longer edge would exceed it, both edges are instead scaled so the longer
/// one equals `max_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ShortestEdge {
    /// Target length of the shorter edge
    pub size: usize,
    /// Optional cap on the longer edge
    pub max_size: Option<usize>,
    /// Resampling method
    pub mode: InterpolationMode,
    /// Corner-aligned instead of half-pixel-center coordinate mapping
    pub align_corners: bool,
}

impl Default for ShortestEdge {
    fn default() -> Self {
        Self {
            size: 256,
            max_size: None,
            mode: InterpolationMode::Bilinear,
            align_corners: false,
        }
    }
}

impl ShortestEdge {
    /// Scale the shorter edge to `size`
    pub fn new(size: usize) -> Result<Self> {
        let options = Self {
            size,
            ..Self::default()
        };
        options.validate()?;
        Ok(options)
    }

    /// Cap the longer edge at `max_size`
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Set the resampling method
    pub fn with_mode(mut self, mode: InterpolationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the coordinate mapping
    pub fn with_align_corners(mut self, align_corners: bool) -> Self {
        self.align_corners = align_corners;
        self
    }

    /// Check that `size` and `max_size` are positive
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::invalid_parameter("size", self.size, "must be positive"));
        }
        if self.max_size == Some(0) {
            return Err(Error::invalid_parameter("max_size", 0, "must be positive"));
        }
        Ok(())
    }

    /// Fixed-size options for an image of `height x width`
    pub fn resolve(&self, height: usize, width: usize) -> Result<ResizeOptions> {
        self.validate()?;
        let (height, width) = shortest_edge_size(height, width, self.size, self.max_size)?;
        Ok(ResizeOptions {
            height,
            width,
            mode: self.mode,
            align_corners: self.align_corners,
        })
    }
}

impl Transform for ShortestEdge {
    fn name(&self) -> &'static str {
        "resize_shortest_edge"
    }

    fn output_shape(&self, input: &[usize]) -> Result<Shape> {
        let (h, w) = spatial_dims(input)?;
        let options = self.resolve(h, w)?;
        resize_output_shape(input, options.height, options.width)
    }

    fn apply(&self, input: &Tensor) -> Result<Tensor> {
        resize_shortest_edge(input, self)
    }
}

/// Height and width of a CHW or NCHW shape
fn spatial_dims(shape: &[usize]) -> Result<(usize, usize)> {
    match shape {
        [_, h, w] | [_, _, h, w] => Ok((*h, *w)),
        _ => Err(Error::bad_rank(shape)),
    }
}

/// Shape of a CHW or NCHW input after resizing to `height x width`
pub fn resize_output_shape(input: &[usize], height: usize, width: usize) -> Result<Shape> {
    spatial_dims(input)?;
    let mut shape = Shape::from(input);
    let ndim = shape.ndim();
    shape.set(ndim - 2, height);
    shape.set(ndim - 1, width);
    Ok(shape)
}

/// Target `(height, width)` for a shortest-edge resize
///
/// `scale = size / min(height, width)`; if `max(height, width) * scale`
/// exceeds `max_size`, the scale becomes `max_size / max(height, width)`.
/// Both results are rounded and never smaller than 1.
pub fn shortest_edge_size(
    height: usize,
    width: usize,
    size: usize,
    max_size: Option<usize>,
) -> Result<(usize, usize)> {
    if height == 0 || width == 0 {
        return Err(Error::InvalidShape {
            shape: vec![height, width],
        });
    }
    if size == 0 {
        return Err(Error::invalid_parameter("size", size, "must be positive"));
    }

    let short = height.min(width) as f64;
    let long = height.max(width) as f64;
    let mut scale = size as f64 / short;
    if let Some(max_size) = max_size {
        if max_size == 0 {
            return Err(Error::invalid_parameter("max_size", max_size, "must be positive"));
        }
        if long * scale > max_size as f64 {
            scale = max_size as f64 / long;
        }
    }

    let scaled = |dim: usize| ((dim as f64 * scale).round() as usize).max(1);
    Ok((scaled(height), scaled(width)))
}

/// Resize the two trailing (spatial) axes of a contiguous CHW or NCHW tensor
///
/// Every channel plane of every batch element is resampled independently.
/// The result has the input's dtype and rank and new row-major storage.
/// Integer dtypes are computed in f64 and rounded and clamped on write.
pub fn resize(input: &Tensor, options: &ResizeOptions) -> Result<Tensor> {
    options.validate()?;
    let out_shape = resize_output_shape(input.shape(), options.height, options.width)?;
    if !input.is_contiguous() {
        return Err(Error::NotContiguous);
    }

    let (src_h, src_w) = spatial_dims(input.shape())?;
    let planes = input.numel() / (src_h * src_w);
    debug!(
        shape = ?input.shape(),
        target = ?out_shape,
        dtype = %input.dtype(),
        mode = %options.mode,
        align_corners = options.align_corners,
        "resize"
    );

    let buffer = dispatch_dtype!(input.dtype(), T => {
        let src = input.contiguous_slice::<T>()?;
        T::into_buffer(resize_planes(
            src,
            planes,
            (src_h, src_w),
            (options.height, options.width),
            options.mode,
            options.align_corners,
        ))
    });
    Tensor::wrap(buffer, input.dtype(), &out_shape)
}

/// Aspect-preserving resize of a contiguous CHW or NCHW tensor
pub fn resize_shortest_edge(input: &Tensor, options: &ShortestEdge) -> Result<Tensor> {
    let (h, w) = spatial_dims(input.shape())?;
    resize(input, &options.resolve(h, w)?)
}

impl Tensor {
    /// Resize the spatial axes to a fixed size
    ///
    /// See [`resize`].
    pub fn resize(&self, options: &ResizeOptions) -> Result<Tensor> {
        resize(self, options)
    }

    /// Resize the spatial axes preserving aspect ratio
    ///
    /// See [`resize_shortest_edge`].
    pub fn resize_shortest_edge(&self, options: &ShortestEdge) -> Result<Tensor> {
        resize_shortest_edge(self, options)
    }
}
