//! Per-channel normalization and scalar rescaling

use super::traits::Transform;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::tensor::{Buffer, Layout, Shape, Tensor};
use tracing::debug;

/// ImageNet per-channel mean (RGB, values in `[0, 1]`)
pub const IMAGENET_MEAN: [f64; 3] = [0.485, 0.456, 0.406];

/// ImageNet per-channel standard deviation (RGB, values in `[0, 1]`)
pub const IMAGENET_STD: [f64; 3] = [0.229, 0.224, 0.225];

/// Channel count and plane size of a CHW or NCHW shape
fn channel_geometry(shape: &[usize]) -> Result<(usize, usize)> {
    match shape {
        [c, h, w] | [_, c, h, w] => Ok((*c, h * w)),
        _ => Err(Error::bad_rank(shape)),
    }
}

/// `(x - mean[c]) / std[c]` along the channel axis of a CHW or NCHW tensor
///
/// `mean` and `std` hold either one value per channel or a single value
/// broadcast to every channel. Only float tensors can be normalized.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Normalize {
    /// Per-channel mean
    pub mean: Vec<f64>,
    /// Per-channel standard deviation
    pub std: Vec<f64>,
}

impl Default for Normalize {
    fn default() -> Self {
        Self {
            mean: IMAGENET_MEAN.to_vec(),
            std: IMAGENET_STD.to_vec(),
        }
    }
}

impl Normalize {
    /// Normalize with the given statistics
    pub fn new(mean: impl Into<Vec<f64>>, std: impl Into<Vec<f64>>) -> Result<Self> {
        let normalize = Self {
            mean: mean.into(),
            std: std.into(),
        };
        normalize.validate()?;
        Ok(normalize)
    }

    /// Check the statistics independently of any tensor
    pub fn validate(&self) -> Result<()> {
        if self.mean.is_empty() {
            return Err(Error::invalid_parameter("mean", "[]", "at least one value required"));
        }
        if self.std.is_empty() {
            return Err(Error::invalid_parameter("std", "[]", "at least one value required"));
        }
        if let Some(&bad) = self.std.iter().find(|&&s| s == 0.0 || !s.is_finite()) {
            return Err(Error::invalid_parameter(
                "std",
                bad,
                "standard deviation must be finite and non-zero",
            ));
        }
        if let Some(&bad) = self.mean.iter().find(|m| !m.is_finite()) {
            return Err(Error::invalid_parameter("mean", bad, "mean must be finite"));
        }
        Ok(())
    }

    /// Check the statistics against a tensor shape
    fn check_shape(&self, shape: &[usize]) -> Result<(usize, usize)> {
        self.validate()?;
        let (channels, plane) = channel_geometry(shape)?;
        for (name, values) in [("mean", &self.mean), ("std", &self.std)] {
            if values.len() != channels && values.len() != 1 {
                return Err(Error::invalid_parameter(
                    name,
                    format!("{values:?}"),
                    format!("expected {channels} values or 1, got {}", values.len()),
                ));
            }
        }
        Ok((channels, plane))
    }

    /// Check the statistics against a tensor shape and dtype
    fn check(&self, shape: &[usize], dtype: DType) -> Result<(usize, usize)> {
        let geometry = self.check_shape(shape)?;
        if !dtype.is_float() {
            return Err(Error::unsupported_dtype(dtype, "normalize"));
        }
        Ok(geometry)
    }

    /// Statistics expanded to one entry per channel
    fn per_channel(&self, channels: usize) -> (Vec<f64>, Vec<f64>) {
        let expand = |values: &[f64]| -> Vec<f64> {
            if values.len() == channels {
                values.to_vec()
            } else {
                vec![values[0]; channels]
            }
        };
        (expand(&self.mean), expand(&self.std))
    }
}

impl Transform for Normalize {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn output_shape(&self, input: &[usize]) -> Result<Shape> {
        self.check_shape(input)?;
        Ok(Shape::from(input))
    }

    fn apply(&self, input: &Tensor) -> Result<Tensor> {
        self.check(input.shape(), input.dtype())?;
        let mut out = input.deep_clone();
        out.normalize_(self)?;
        Ok(out)
    }
}

/// Apply `(x - mean[c]) / std[c]` to every element the layout addresses
fn normalize_kernel<T: Element>(
    data: &mut [T],
    layout: &Layout,
    channels: usize,
    plane: usize,
    mean: &[f64],
    std: &[f64],
) {
    for (i, offset) in layout.offsets().enumerate() {
        let c = (i / plane) % channels;
        data[offset] = T::from_f64((data[offset].to_f64() - mean[c]) / std[c]);
    }
}

/// Multiply every element the layout addresses by `factor`
fn rescale_kernel<T: Element>(data: &mut [T], layout: &Layout, factor: f64) {
    for offset in layout.offsets() {
        data[offset] = T::from_f64(data[offset].to_f64() * factor);
    }
}

/// Multiply every element by a constant
///
/// Float inputs keep their dtype. Integer inputs produce an `F32` tensor,
/// the usual `u8 -> [0, 1]` step with `factor = 1/255`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rescale {
    /// Multiplier
    pub factor: f64,
}

impl Default for Rescale {
    fn default() -> Self {
        Self {
            factor: 1.0 / 255.0,
        }
    }
}

impl Rescale {
    /// Rescale by `factor`
    pub fn new(factor: f64) -> Result<Self> {
        let rescale = Self { factor };
        rescale.validate()?;
        Ok(rescale)
    }

    /// Check that the factor is finite
    pub fn validate(&self) -> Result<()> {
        if !self.factor.is_finite() {
            return Err(Error::invalid_parameter("factor", self.factor, "must be finite"));
        }
        Ok(())
    }
}

impl Transform for Rescale {
    fn name(&self) -> &'static str {
        "rescale"
    }

    fn output_shape(&self, input: &[usize]) -> Result<Shape> {
        self.validate()?;
        Ok(Shape::from(input))
    }

    fn apply(&self, input: &Tensor) -> Result<Tensor> {
        self.validate()?;
        debug!(shape = ?input.shape(), dtype = %input.dtype(), factor = self.factor, "rescale");
        if input.dtype().is_float() {
            let mut out = input.deep_clone();
            out.rescale_(self.factor)?;
            return Ok(out);
        }

        let scaled: Vec<f32> = input
            .to_f64_vec()
            .into_iter()
            .map(|v| (v * self.factor) as f32)
            .collect();
        Tensor::from_vec(scaled, input.shape())
    }
}

impl Tensor {
    /// Normalize per channel in place
    ///
    /// Every check (rank, statistic lengths, zero std, dtype) runs before
    /// any element is written, so a failed call leaves the tensor untouched.
    /// Storage shared with other views is copied first. A view that reaches
    /// the same element through several indices is first replaced by a
    /// dense copy.
    pub fn normalize_(&mut self, normalize: &Normalize) -> Result<()> {
        let (channels, plane) = normalize.check(self.shape(), self.dtype())?;
        let (mean, std) = normalize.per_channel(channels);
        debug!(shape = ?self.shape(), dtype = %self.dtype(), channels, "normalize in place");

        self.detach_aliased();
        let dtype = self.dtype();
        let layout = self.layout().clone();
        match self.buffer_mut() {
            Buffer::F32(data) => normalize_kernel(data, &layout, channels, plane, &mean, &std),
            Buffer::F64(data) => normalize_kernel(data, &layout, channels, plane, &mean, &std),
            _ => return Err(Error::unsupported_dtype(dtype, "normalize")),
        }
        Ok(())
    }

    /// Replace a self-aliasing view with a dense copy so that in-place
    /// kernels write each element once
    fn detach_aliased(&mut self) {
        if !self.layout().is_non_overlapping() {
            debug!(shape = ?self.shape(), strides = ?self.strides(), "materialize aliased view");
            *self = self.deep_clone();
        }
    }

    /// Normalize per channel into a new tensor
    pub fn normalize(&self, normalize: &Normalize) -> Result<Tensor> {
        normalize.apply(self)
    }

    /// Multiply every element by `factor` in place (float dtypes only)
    pub fn rescale_(&mut self, factor: f64) -> Result<()> {
        Rescale::new(factor)?;
        let dtype = self.dtype();
        if !dtype.is_float() {
            return Err(Error::unsupported_dtype(dtype, "rescale_"));
        }

        self.detach_aliased();
        let layout = self.layout().clone();
        match self.buffer_mut() {
            Buffer::F32(data) => rescale_kernel(data, &layout, factor),
            Buffer::F64(data) => rescale_kernel(data, &layout, factor),
            _ => return Err(Error::unsupported_dtype(dtype, "rescale_")),
        }
        Ok(())
    }

    /// Multiply every element by `factor` into a new tensor
    ///
    /// See [`Rescale`] for the output dtype.
    pub fn rescale(&self, factor: f64) -> Result<Tensor> {
        Rescale::new(factor)?.apply(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::{MemoryFormat, Storage};

    #[test]
    fn test_validate_zero_std() {
        let err = Normalize::new(vec![0.5], vec![0.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "std", .. }));
    }

    #[test]
    fn test_length_must_match_channels() {
        let t = Tensor::zeros(&[3, 2, 2], DType::F32).unwrap();
        let n = Normalize::new(vec![0.1, 0.2], vec![1.0]).unwrap();
        assert!(matches!(
            n.apply(&t),
            Err(Error::InvalidParameter { name: "mean", .. })
        ));
    }

    #[test]
    fn test_broadcast_single_value() {
        let t = Tensor::from_slice(&[1.0f64, 2.0, 3.0, 4.0], &[2, 1, 2]).unwrap();
        let out = t.normalize(&Normalize::new([1.0], [2.0]).unwrap()).unwrap();
        assert_eq!(out.to_vec::<f64>().unwrap(), vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_in_place_failure_leaves_data() {
        let mut t = Tensor::from_slice(&[10u8, 20, 30], &[3, 1, 1]).unwrap();
        let err = t.normalize_(&Normalize::default()).unwrap_err();
        assert_eq!(err, Error::unsupported_dtype(DType::U8, "normalize"));
        assert_eq!(t.to_vec::<u8>().unwrap(), vec![10, 20, 30]);
    }

    #[test]
    fn test_in_place_on_broadcast_view() {
        let storage = Storage::from_vec(vec![10.0f64, 20.0]);
        let view = Tensor::from_parts(
            storage.clone(),
            &[1, 3, 2],
            Some(&[0, 0, 1]),
            0,
            MemoryFormat::RowMajor,
        )
        .unwrap();
        let stats = Normalize::new([1.0], [2.0]).unwrap();
        let expected = view.normalize(&stats).unwrap().to_vec::<f64>().unwrap();
        assert_eq!(expected, vec![4.5, 9.5, 4.5, 9.5, 4.5, 9.5]);

        let mut in_place = view.clone();
        in_place.normalize_(&stats).unwrap();
        assert_eq!(in_place.to_vec::<f64>().unwrap(), expected);
        assert!(in_place.is_contiguous());
        assert_eq!(view.to_vec::<f64>().unwrap(), vec![10.0, 20.0, 10.0, 20.0, 10.0, 20.0]);

        let mut scaled = view.clone();
        scaled.rescale_(0.5).unwrap();
        assert_eq!(scaled.to_vec::<f64>().unwrap(), vec![5.0, 10.0, 5.0, 10.0, 5.0, 10.0]);
        assert_eq!(storage.get(0).unwrap(), 10.0);
    }

    #[test]
    fn test_rescale_integer_to_f32() {
        let t = Tensor::from_slice(&[0u8, 51, 255], &[1, 1, 3]).unwrap();
        let out = t.rescale(1.0 / 255.0).unwrap();
        assert_eq!(out.dtype(), DType::F32);
        assert_eq!(out.to_vec::<f32>().unwrap(), vec![0.0, 0.2, 1.0]);
    }
}
