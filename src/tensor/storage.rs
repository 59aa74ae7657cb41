//! Storage: typed host buffers with Arc-based sharing

use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::{dispatch_buffer, dispatch_dtype};
use std::sync::Arc;

/// One owned run of elements of a single scalar type
///
/// The variant is the physical representation, so the tag can never
/// disagree with the data it describes.
#[derive(Clone, PartialEq)]
pub enum Buffer {
    /// 32-bit floats
    F32(Vec<f32>),
    /// 64-bit floats
    F64(Vec<f64>),
    /// 8-bit signed integers
    I8(Vec<i8>),
    /// 16-bit signed integers
    I16(Vec<i16>),
    /// 32-bit signed integers
    I32(Vec<i32>),
    /// 64-bit signed integers
    I64(Vec<i64>),
    /// 8-bit unsigned integers
    U8(Vec<u8>),
    /// 16-bit unsigned integers
    U16(Vec<u16>),
    /// 32-bit unsigned integers
    U32(Vec<u32>),
    /// 64-bit unsigned integers
    U64(Vec<u64>),
}

impl Buffer {
    /// Allocate a zero-filled buffer
    pub fn zeros(dtype: DType, len: usize) -> Self {
        dispatch_dtype!(dtype, T => { T::into_buffer(vec![T::from_f64(0.0); len]) })
    }

    /// Element type of the buffer
    pub fn dtype(&self) -> DType {
        dispatch_buffer!(self, data => element_dtype(data.as_slice()))
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        dispatch_buffer!(self, data => data.len())
    }

    /// Check if the buffer holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read one element widened to f64 (index must be in bounds)
    #[inline]
    pub(crate) fn read_f64(&self, index: usize) -> f64 {
        dispatch_buffer!(self, data => data[index].to_f64())
    }

    /// Write one element narrowed from f64 (index must be in bounds)
    #[inline]
    pub(crate) fn write_f64(&mut self, index: usize, value: f64) {
        dispatch_buffer!(self, data => data[index] = Element::from_f64(value))
    }
}

fn element_dtype<T: Element>(_: &[T]) -> DType {
    T::DTYPE
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("dtype", &self.dtype())
            .field("len", &self.len())
            .finish()
    }
}

/// Storage for tensor data
///
/// Storage wraps a typed buffer with reference counting, enabling zero-copy
/// views (transpose, narrow, reshape) that share the underlying elements.
/// Cloning a `Storage` clones the handle, not the data.
///
/// Writes go through copy-on-write: mutating a handle whose buffer is shared
/// first detaches it onto a private copy, so no other handle ever observes
/// the change. Memory is freed when the last handle is dropped.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<Buffer>,
}

impl Storage {
    /// Allocate zero-filled storage of `len` elements
    pub fn zeros(dtype: DType, len: usize) -> Self {
        Self {
            inner: Arc::new(Buffer::zeros(dtype, len)),
        }
    }

    /// Wrap a caller-supplied buffer, checking it against the declared dtype
    pub fn wrap(buffer: Buffer, dtype: DType) -> Result<Self> {
        let actual = buffer.dtype();
        if actual != dtype {
            return Err(Error::type_mismatch(dtype, actual));
        }
        Ok(Self {
            inner: Arc::new(buffer),
        })
    }

    /// Wrap a buffer whose dtype is known to be right (kernel output)
    pub(crate) fn from_buffer(buffer: Buffer) -> Self {
        Self {
            inner: Arc::new(buffer),
        }
    }

    /// Create storage that takes ownership of a typed vector
    pub fn from_vec<T: Element>(data: Vec<T>) -> Self {
        Self {
            inner: Arc::new(T::into_buffer(data)),
        }
    }

    /// Create storage by copying a typed slice
    pub fn from_slice<T: Element>(data: &[T]) -> Self {
        Self::from_vec(data.to_vec())
    }

    /// Decode storage from a raw little-endian byte buffer
    pub fn from_le_bytes(bytes: &[u8], dtype: DType) -> Result<Self> {
        let width = dtype.size_in_bytes();
        if bytes.len() % width != 0 {
            return Err(Error::invalid_argument(
                "bytes",
                format!(
                    "{} bytes is not a whole number of {dtype} elements",
                    bytes.len()
                ),
            ));
        }
        let buffer = dispatch_dtype!(dtype, T => {
            T::into_buffer(bytes.chunks_exact(width).map(T::read_le).collect())
        });
        Ok(Self {
            inner: Arc::new(buffer),
        })
    }

    /// Borrow the underlying buffer
    #[inline]
    pub fn buffer(&self) -> &Buffer {
        &self.inner
    }

    /// Borrow the elements as a typed slice
    pub fn as_slice<T: Element>(&self) -> Result<&[T]> {
        T::slice(&self.inner).ok_or_else(|| Error::type_mismatch(T::DTYPE, self.dtype()))
    }

    /// Mutable access to the buffer, detaching from other handles first
    pub(crate) fn make_mut(&mut self) -> &mut Buffer {
        Arc::make_mut(&mut self.inner)
    }

    /// Get the number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if storage is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.inner.dtype()
    }

    /// Get size in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.len() * self.dtype().size_in_bytes()
    }

    /// Get the reference count
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Check if this is the only reference
    #[inline]
    pub fn is_unique(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }

    /// Check whether two handles share one buffer
    #[inline]
    pub fn ptr_eq(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Read one element widened to f64
    pub fn get(&self, index: usize) -> Result<f64> {
        self.check_index(index)?;
        Ok(self.inner.read_f64(index))
    }

    /// Write one element, narrowing `value` to the storage dtype
    ///
    /// Floats store the value as-is (losing precision when narrowing to
    /// f32). Integers round to nearest and clamp into range, so writing 300
    /// into u8 storage stores 255.
    pub fn set(&mut self, index: usize, value: f64) -> Result<()> {
        self.check_index(index)?;
        self.make_mut().write_f64(index, value);
        Ok(())
    }

    /// Read one element without widening through f64
    ///
    /// Use this for i64/u64 data whose magnitude exceeds 2^53.
    pub fn get_exact<T: Element>(&self, index: usize) -> Result<T> {
        self.check_index(index)?;
        Ok(self.as_slice::<T>()?[index])
    }

    /// Write one element without narrowing through f64
    pub fn set_exact<T: Element>(&mut self, index: usize, value: T) -> Result<()> {
        self.check_index(index)?;
        if T::DTYPE != self.dtype() {
            return Err(Error::type_mismatch(T::DTYPE, self.dtype()));
        }
        if let Some(data) = T::slice_mut(self.make_mut()) {
            data[index] = value;
        }
        Ok(())
    }

    /// Deep copy into a new, unshared buffer
    pub fn deep_clone(&self) -> Self {
        Self {
            inner: Arc::new(Buffer::clone(&self.inner)),
        }
    }

    /// Encode every element as little-endian bytes
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size_in_bytes());
        dispatch_buffer!(self.buffer(), data => {
            if cfg!(target_endian = "little") {
                out.extend_from_slice(bytemuck::cast_slice(data.as_slice()));
            } else {
                for &value in data.iter() {
                    value.write_le(&mut out);
                }
            }
        });
        out
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len() {
            return Err(Error::out_of_range(index, self.len()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("len", &self.len())
            .field("dtype", &self.dtype())
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}
