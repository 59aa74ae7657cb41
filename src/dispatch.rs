//! DType dispatch utilities
//!
//! pixr resolves the runtime dtype once per operation and then runs a
//! generic kernel monomorphized for the concrete element type. Two macros
//! cover the two directions of that resolution:
//!
//! - [`dispatch_dtype!`](crate::dispatch_dtype) binds a type alias from a
//!   `DType` value (used when allocating or decoding).
//! - [`dispatch_buffer!`](crate::dispatch_buffer) destructures a
//!   [`Buffer`](crate::tensor::Buffer) into its typed vector (used when
//!   reading existing data).
//!
//! # Usage
//!
//! ```ignore
//! let width = dispatch_dtype!(dtype, T => { std::mem::size_of::<T>() });
//! let first = dispatch_buffer!(&buffer, data => data[0].to_f64());
//! ```

/// Macro for runtime dtype dispatch to typed code.
///
/// Takes a `DType` value and evaluates a block with `$T` bound to the
/// corresponding Rust type. Every dtype has a concrete element type, so the
/// match is exhaustive and no error path exists.
#[macro_export]
macro_rules! dispatch_dtype {
    ($dtype:expr, $T:ident => $body:block) => {
        match $dtype {
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            $crate::dtype::DType::I8 => {
                type $T = i8;
                $body
            }
            $crate::dtype::DType::I16 => {
                type $T = i16;
                $body
            }
            $crate::dtype::DType::I32 => {
                type $T = i32;
                $body
            }
            $crate::dtype::DType::I64 => {
                type $T = i64;
                $body
            }
            $crate::dtype::DType::U8 => {
                type $T = u8;
                $body
            }
            $crate::dtype::DType::U16 => {
                type $T = u16;
                $body
            }
            $crate::dtype::DType::U32 => {
                type $T = u32;
                $body
            }
            $crate::dtype::DType::U64 => {
                type $T = u64;
                $body
            }
        }
    };
}

/// Macro for destructuring a `Buffer` into its typed contents.
///
/// `$data` is bound to the inner `Vec<T>` (by value, reference, or mutable
/// reference depending on how `$buffer` is passed) and `$body` is evaluated
/// once per variant.
#[macro_export]
macro_rules! dispatch_buffer {
    ($buffer:expr, $data:ident => $body:expr) => {
        match $buffer {
            $crate::tensor::Buffer::F32($data) => $body,
            $crate::tensor::Buffer::F64($data) => $body,
            $crate::tensor::Buffer::I8($data) => $body,
            $crate::tensor::Buffer::I16($data) => $body,
            $crate::tensor::Buffer::I32($data) => $body,
            $crate::tensor::Buffer::I64($data) => $body,
            $crate::tensor::Buffer::U8($data) => $body,
            $crate::tensor::Buffer::U16($data) => $body,
            $crate::tensor::Buffer::U32($data) => $body,
            $crate::tensor::Buffer::U64($data) => $body,
        }
    };
}
