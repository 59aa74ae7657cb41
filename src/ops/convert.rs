//! Dtype conversion and channel-order reformatting

use super::traits::Transform;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::kernels::cast_kernel;
use crate::tensor::{infer_reshape, validate_permutation, Shape, Tensor};
use crate::{dispatch_buffer, dispatch_dtype};
use tracing::debug;

/// Convert to another dtype
///
/// Integer targets round and clamp, following the storage narrowing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cast {
    /// Target dtype
    pub dtype: DType,
}

impl Transform for Cast {
    fn name(&self) -> &'static str {
        "cast"
    }

    fn output_shape(&self, input: &[usize]) -> Result<Shape> {
        Ok(Shape::from(input))
    }

    fn apply(&self, input: &Tensor) -> Result<Tensor> {
        input.to_dtype(self.dtype)
    }
}

/// Permutation taking channels-last order to channels-first order
fn to_channels_first_perm(ndim: usize) -> Option<&'static [usize]> {
    match ndim {
        3 => Some(&[2, 0, 1][..]),
        4 => Some(&[0, 3, 1, 2][..]),
        _ => None,
    }
}

/// Permutation taking channels-first order to channels-last order
fn to_channels_last_perm(ndim: usize) -> Option<&'static [usize]> {
    match ndim {
        3 => Some(&[1, 2, 0][..]),
        4 => Some(&[0, 2, 3, 1][..]),
        _ => None,
    }
}

/// HWC -> CHW or NHWC -> NCHW (zero-copy)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToChannelsFirst;

impl Transform for ToChannelsFirst {
    fn name(&self) -> &'static str {
        "to_channels_first"
    }

    fn output_shape(&self, input: &[usize]) -> Result<Shape> {
        let perm = to_channels_first_perm(input.len()).ok_or_else(|| Error::bad_rank(input))?;
        permute_output_shape(input, perm)
    }

    fn apply(&self, input: &Tensor) -> Result<Tensor> {
        let perm =
            to_channels_first_perm(input.ndim()).ok_or_else(|| Error::bad_rank(input.shape()))?;
        input.permute(perm)
    }
}

/// CHW -> HWC or NCHW -> NHWC (zero-copy)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToChannelsLast;

impl Transform for ToChannelsLast {
    fn name(&self) -> &'static str {
        "to_channels_last"
    }

    fn output_shape(&self, input: &[usize]) -> Result<Shape> {
        let perm = to_channels_last_perm(input.len()).ok_or_else(|| Error::bad_rank(input))?;
        permute_output_shape(input, perm)
    }

    fn apply(&self, input: &Tensor) -> Result<Tensor> {
        let perm =
            to_channels_last_perm(input.ndim()).ok_or_else(|| Error::bad_rank(input.shape()))?;
        input.permute(perm)
    }
}

/// Prepend a batch dimension of size 1 (zero-copy)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddBatchDim;

impl Transform for AddBatchDim {
    fn name(&self) -> &'static str {
        "add_batch_dim"
    }

    fn output_shape(&self, input: &[usize]) -> Result<Shape> {
        let mut shape = Shape::from(input);
        shape.validate()?;
        shape.insert(0, 1);
        Ok(shape)
    }

    fn apply(&self, input: &Tensor) -> Result<Tensor> {
        input.unsqueeze(0)
    }
}

/// Reshape to a target that may contain one `-1` wildcard
///
/// Zero-copy; the input must be contiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reshape {
    /// Target shape
    pub shape: Vec<isize>,
}

impl Transform for Reshape {
    fn name(&self) -> &'static str {
        "reshape"
    }

    fn output_shape(&self, input: &[usize]) -> Result<Shape> {
        reshape_output_shape(input, &self.shape)
    }

    fn apply(&self, input: &Tensor) -> Result<Tensor> {
        input.reshape_infer(&self.shape)
    }
}

/// Shape after permuting `input` by `perm`
pub fn permute_output_shape(input: &[usize], perm: &[usize]) -> Result<Shape> {
    validate_permutation(perm, input.len())?;
    Ok(perm.iter().map(|&p| input[p]).collect())
}

/// Shape after reshaping `input` to `target`, resolving a `-1` wildcard
pub fn reshape_output_shape(input: &[usize], target: &[isize]) -> Result<Shape> {
    let input = Shape::from(input);
    input.validate()?;
    let resolved = infer_reshape(input.numel(), target)?;
    let numel: usize = resolved.iter().product();
    if numel != input.numel() {
        return Err(Error::SizeMismatch {
            expected: input.numel(),
            got: numel,
        });
    }
    Ok(Shape::from(resolved))
}

impl Tensor {
    /// Convert to `dtype` in new row-major storage
    ///
    /// Converting to the current dtype returns [`Tensor::contiguous`] and so
    /// does not copy a contiguous tensor.
    pub fn to_dtype(&self, dtype: DType) -> Result<Tensor> {
        if dtype == self.dtype() {
            return Ok(self.contiguous());
        }
        debug!(shape = ?self.shape(), from = %self.dtype(), to = %dtype, "cast");

        let src = self.contiguous();
        let (start, end) = (src.offset(), src.offset() + src.numel());
        let buffer = dispatch_buffer!(src.storage().buffer(), data => {
            dispatch_dtype!(dtype, D => { D::into_buffer(cast_kernel::<_, D>(&data[start..end])) })
        });
        Tensor::wrap(buffer, dtype, src.shape())
    }
}
