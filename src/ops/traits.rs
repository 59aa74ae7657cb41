//! The `Transform` trait shared by every preprocessing operation

use crate::error::Result;
use crate::tensor::{Shape, Tensor};

/// A single preprocessing step over a tensor
///
/// Each transform pairs a pure execution function with a pure shape
/// inference function, so a caller can validate a sequence of transforms
/// against an input shape without touching any data.
///
/// Implementations must agree with themselves: whenever `apply` succeeds on
/// a tensor of shape `s`, `output_shape(s)` succeeds and equals the shape of
/// the returned tensor.
pub trait Transform {
    /// Short stable identifier used in logs and error reports
    fn name(&self) -> &'static str;

    /// Shape produced by [`Transform::apply`] for an input of `input` shape
    fn output_shape(&self, input: &[usize]) -> Result<Shape>;

    /// Run the transform
    ///
    /// Zero-copy transforms return a view sharing the input's storage;
    /// materializing ones return a tensor backed by new storage. The input
    /// is never modified.
    fn apply(&self, input: &Tensor) -> Result<Tensor>;
}
