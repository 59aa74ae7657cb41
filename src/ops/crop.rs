//! Center cropping (zero-copy)

use super::traits::Transform;
use crate::error::{Error, Result};
use crate::tensor::{Shape, Tensor};

/// Crop a centered `height x width` window from the spatial axes
///
/// The window starts at `top = (H - height) / 2` and `left = (W - width) / 2`,
/// so odd margins leave the extra row or column at the bottom or right. The
/// result is a view into the input's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CenterCrop {
    /// Window height
    pub height: usize,
    /// Window width
    pub width: usize,
}

impl CenterCrop {
    /// Crop to `height x width`
    pub fn new(height: usize, width: usize) -> Result<Self> {
        let crop = Self { height, width };
        crop.validate()?;
        Ok(crop)
    }

    /// Square crop
    pub fn square(size: usize) -> Result<Self> {
        Self::new(size, size)
    }

    /// Check that both window dimensions are positive
    pub fn validate(&self) -> Result<()> {
        if self.height == 0 {
            return Err(Error::invalid_parameter("height", self.height, "must be positive"));
        }
        if self.width == 0 {
            return Err(Error::invalid_parameter("width", self.width, "must be positive"));
        }
        Ok(())
    }

    /// `(top, left)` corner of the window inside an `h x w` image
    fn origin(&self, h: usize, w: usize) -> Result<(usize, usize)> {
        self.validate()?;
        if self.height > h {
            return Err(Error::invalid_parameter(
                "height",
                self.height,
                format!("crop is taller than the image ({h})"),
            ));
        }
        if self.width > w {
            return Err(Error::invalid_parameter(
                "width",
                self.width,
                format!("crop is wider than the image ({w})"),
            ));
        }
        Ok(((h - self.height) / 2, (w - self.width) / 2))
    }
}

impl Transform for CenterCrop {
    fn name(&self) -> &'static str {
        "center_crop"
    }

    fn output_shape(&self, input: &[usize]) -> Result<Shape> {
        center_crop_output_shape(input, self.height, self.width)
    }

    fn apply(&self, input: &Tensor) -> Result<Tensor> {
        center_crop(input, self)
    }
}

/// Shape of a CHW or NCHW input after a `height x width` center crop
pub fn center_crop_output_shape(input: &[usize], height: usize, width: usize) -> Result<Shape> {
    let (h, w) = match input {
        [_, h, w] | [_, _, h, w] => (*h, *w),
        _ => return Err(Error::bad_rank(input)),
    };
    CenterCrop { height, width }.origin(h, w)?;

    let mut shape = Shape::from(input);
    let ndim = shape.ndim();
    shape.set(ndim - 2, height);
    shape.set(ndim - 1, width);
    Ok(shape)
}

/// Center-crop the spatial axes of a CHW or NCHW tensor (zero-copy)
pub fn center_crop(input: &Tensor, crop: &CenterCrop) -> Result<Tensor> {
    center_crop_output_shape(input.shape(), crop.height, crop.width)?;
    let ndim = input.ndim();
    let (top, left) = crop.origin(input.shape()[ndim - 2], input.shape()[ndim - 1])?;
    input
        .narrow(ndim - 2, top, crop.height)?
        .narrow(ndim - 1, left, crop.width)
}

impl Tensor {
    /// Center-crop the spatial axes (zero-copy)
    ///
    /// See [`center_crop`].
    pub fn center_crop(&self, crop: &CenterCrop) -> Result<Tensor> {
        center_crop(self, crop)
    }
}
