//! Error types for pixr

use crate::dtype::DType;
use crate::tensor::MemoryFormat;
use thiserror::Error;

/// Result type alias using pixr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pixr operations
///
/// Every variant is a contract violation raised synchronously by the failing
/// call. None of them are transient, and an operation that returns an error
/// has not modified any tensor or storage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Actual shape or rank is incompatible with the operation
    #[error("Shape mismatch: got {got:?}{}", expected_hint(.expected))]
    ShapeMismatch {
        /// Expected shape, when the operation can name one
        expected: Option<Vec<usize>>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Shape is empty or contains a zero-sized dimension
    #[error("Invalid shape {shape:?}: rank must be >= 1 and every dimension >= 1")]
    InvalidShape {
        /// The rejected shape
        shape: Vec<usize>,
    },

    /// Element counts disagree (reshape, buffer wrapping)
    #[error("Size mismatch: expected {expected} elements, got {got}")]
    SizeMismatch {
        /// Expected element count
        expected: usize,
        /// Actual element count
        got: usize,
    },

    /// Memory format cannot be applied to a tensor of this rank
    #[error("Memory format {format:?} is not supported for rank {ndim}")]
    UnsupportedLayout {
        /// Requested format
        format: MemoryFormat,
        /// Rank of the shape
        ndim: usize,
    },

    /// Tensor is not contiguous when contiguous memory is required
    #[error("Operation requires contiguous tensor")]
    NotContiguous,

    /// Parameter value outside its domain
    #[error("Invalid parameter '{name}' = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Rendered value
        value: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Index out of bounds
    #[error("Index {index} out of range for size {size}")]
    IndexOutOfRange {
        /// The invalid index
        index: usize,
        /// Exclusive upper bound
        size: usize,
    },

    /// Structurally invalid argument
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Buffer's physical type disagrees with the declared dtype
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Declared dtype
        expected: DType,
        /// Physical dtype
        got: DType,
    },

    /// Operation does not support this dtype
    #[error("Unsupported dtype {dtype} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },
}

fn expected_hint(expected: &Option<Vec<usize>>) -> String {
    match expected {
        Some(shape) => format!(", expected {shape:?}"),
        None => String::new(),
    }
}

impl Error {
    /// Create a shape mismatch error with an expected-shape hint
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: Some(expected.to_vec()),
            got: got.to_vec(),
        }
    }

    /// Create a shape mismatch error for a rank requirement
    pub fn bad_rank(got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: None,
            got: got.to_vec(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(
        name: &'static str,
        value: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    /// Create an index out of range error
    pub fn out_of_range(index: usize, size: usize) -> Self {
        Self::IndexOutOfRange { index, size }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: DType, got: DType) -> Self {
        Self::TypeMismatch { expected, got }
    }

    /// Create an unsupported dtype error
    pub fn unsupported_dtype(dtype: DType, op: &'static str) -> Self {
        Self::UnsupportedDType { dtype, op }
    }
}
