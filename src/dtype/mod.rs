//! Data type system for pixr tensors
//!
//! This module provides the `DType` enum representing the ten scalar kinds a
//! pixr tensor can hold, together with the numeric type codes shared with the
//! downstream inference runtime.

mod element;

pub use element::Element;

use crate::error::{Error, Result};
use std::fmt;

// ============================================================================
// DType Enum
// ============================================================================

/// Data types supported by pixr tensors
///
/// The set is closed: two float widths, four signed and four unsigned integer
/// widths. Each variant maps 1:1 onto an ONNX `TensorProto.DataType` code
/// (see [`DType::type_code`]).
///
/// # Type Code Stability
///
/// The type codes are **stable** and must never be renumbered: the inference
/// runtime interprets raw tensor buffers through them.
///
/// | DType | Code |
/// |-------|------|
/// | F32   | 1    |
/// | U8    | 2    |
/// | I8    | 3    |
/// | U16   | 4    |
/// | I16   | 5    |
/// | I32   | 6    |
/// | I64   | 7    |
/// | F64   | 11   |
/// | U32   | 12   |
/// | U64   | 13   |
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DType {
    /// 32-bit floating point (most common)
    F32,
    /// 64-bit floating point
    F64,
    /// 8-bit signed integer
    I8,
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 8-bit unsigned integer (raw pixel data)
    U8,
    /// 16-bit unsigned integer
    U16,
    /// 32-bit unsigned integer
    U32,
    /// 64-bit unsigned integer
    U64,
}

impl DType {
    /// All dtypes, in declaration order
    pub const ALL: [DType; 10] = [
        Self::F32,
        Self::F64,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
    ];

    /// Size of one element in bytes
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            Self::F64 | Self::I64 | Self::U64 => 8,
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::I16 | Self::U16 => 2,
            Self::I8 | Self::U8 => 1,
        }
    }

    /// Returns true if this is a floating point type
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Returns true if this is a signed integer type
    #[inline]
    pub const fn is_signed_int(self) -> bool {
        matches!(self, Self::I64 | Self::I32 | Self::I16 | Self::I8)
    }

    /// Returns true if this is an unsigned integer type
    #[inline]
    pub const fn is_unsigned_int(self) -> bool {
        matches!(self, Self::U64 | Self::U32 | Self::U16 | Self::U8)
    }

    /// Returns true if this is any integer type (signed or unsigned)
    #[inline]
    pub const fn is_int(self) -> bool {
        self.is_signed_int() || self.is_unsigned_int()
    }

    /// Returns true if this type can represent negative values
    #[inline]
    pub const fn is_signed(self) -> bool {
        self.is_float() || self.is_signed_int()
    }

    /// ONNX `TensorProto.DataType` code for this dtype
    #[inline]
    pub const fn type_code(self) -> i32 {
        match self {
            Self::F32 => 1,
            Self::U8 => 2,
            Self::I8 => 3,
            Self::U16 => 4,
            Self::I16 => 5,
            Self::I32 => 6,
            Self::I64 => 7,
            Self::F64 => 11,
            Self::U32 => 12,
            Self::U64 => 13,
        }
    }

    /// Look up the dtype for an ONNX `TensorProto.DataType` code
    ///
    /// Codes outside the supported table (strings, bools, halfs, complex)
    /// are rejected.
    pub fn from_type_code(code: i32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|dtype| dtype.type_code() == code)
            .ok_or_else(|| {
                Error::invalid_argument("type_code", format!("no supported dtype has code {code}"))
            })
    }

    /// Short name for display (e.g., "f32", "u8")
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::F64 => "f64",
            Self::F32 => "f32",
            Self::I64 => "i64",
            Self::I32 => "i32",
            Self::I16 => "i16",
            Self::I8 => "i8",
            Self::U64 => "u64",
            Self::U32 => "u32",
            Self::U16 => "u16",
            Self::U8 => "u8",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}
