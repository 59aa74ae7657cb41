//! Element trait for mapping Rust types to DType

use super::DType;
use crate::tensor::Buffer;
use bytemuck::Pod;
use std::fmt::Debug;

/// Trait for types that can be elements of a tensor
///
/// This trait connects Rust's type system to pixr's runtime dtype system.
/// It's implemented for the ten primitive numeric types a [`Buffer`] can hold.
///
/// # Bounds
/// - `Copy + Send + Sync + 'static` - Basic trait requirements
/// - `Pod` - Safe byte reinterpretation (bytemuck)
/// - `PartialOrd + Debug` - Comparison and diagnostics
pub trait Element: Copy + Send + Sync + Pod + PartialOrd + Debug + 'static {
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Widen to f64
    fn to_f64(self) -> f64;

    /// Narrow from f64
    ///
    /// Floating types convert with `as` (precision loss only). Integer types
    /// round to nearest (half away from zero) and then clamp into their
    /// representable range; NaN becomes zero.
    fn from_f64(v: f64) -> Self;

    /// Borrow the typed contents of a buffer, if its variant matches
    fn slice(buffer: &Buffer) -> Option<&[Self]>;

    /// Mutably borrow the typed contents of a buffer, if its variant matches
    fn slice_mut(buffer: &mut Buffer) -> Option<&mut [Self]>;

    /// Wrap a vector in the matching buffer variant
    fn into_buffer(data: Vec<Self>) -> Buffer;

    /// Append the little-endian encoding of `self`
    fn write_le(self, out: &mut Vec<u8>);

    /// Decode one element from exactly `DTYPE.size_in_bytes()` little-endian bytes
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    (@body $t:ty, $variant:ident, |$v:ident| $narrow:expr) => {
        impl Element for $t {
            const DTYPE: DType = DType::$variant;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64($v: f64) -> Self {
                // `as` from float to int saturates and maps NaN to 0
                $narrow
            }

            #[inline]
            fn slice(buffer: &Buffer) -> Option<&[Self]> {
                match buffer {
                    Buffer::$variant(data) => Some(data.as_slice()),
                    _ => None,
                }
            }

            #[inline]
            fn slice_mut(buffer: &mut Buffer) -> Option<&mut [Self]> {
                match buffer {
                    Buffer::$variant(data) => Some(data.as_mut_slice()),
                    _ => None,
                }
            }

            #[inline]
            fn into_buffer(data: Vec<Self>) -> Buffer {
                Buffer::$variant(data)
            }

            #[inline]
            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(bytes);
                <$t>::from_le_bytes(raw)
            }
        }
    };
    ($t:ty, $variant:ident, float) => {
        impl_element!(@body $t, $variant, |v| v as $t);
    };
    ($t:ty, $variant:ident, int) => {
        impl_element!(@body $t, $variant, |v| v.round() as $t);
    };
}

impl_element!(f32, F32, float);
impl_element!(f64, F64, float);
impl_element!(i8, I8, int);
impl_element!(i16, I16, int);
impl_element!(i32, I32, int);
impl_element!(i64, I64, int);
impl_element!(u8, U8, int);
impl_element!(u16, U16, int);
impl_element!(u32, U32, int);
impl_element!(u64, U64, int);
