//! Core Tensor type

use super::layout::{Layout, MemoryFormat};
use super::shape::{validate_dims, Shape};
use super::storage::{Buffer, Storage};
use super::strides::Strides;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::kernels::memory::gather_strided;
use crate::{dispatch_buffer, dispatch_dtype};
use std::fmt;
use tracing::{debug, trace};

/// N-dimensional view over a typed host buffer
///
/// `Tensor` is the fundamental data structure in pixr. It consists of:
/// - **Storage**: Reference-counted typed buffer
/// - **Layout**: Shape, strides, and offset defining the view into storage
///
/// # Zero-Copy Views
///
/// Operations like `permute`, `narrow`, `squeeze`, and `reshape` create new
/// tensors that share the same underlying storage. This is achieved through:
/// - Arc-wrapped storage (reference counting)
/// - Modified layout (different strides/offset)
///
/// Shape operations never touch element data. The only operations that
/// write to existing storage are the explicitly in-place ones (`set`,
/// `normalize_`, `rescale_`), and they copy-on-write when the storage is
/// shared with another view.
///
/// # Example
///
/// ```
/// use pixr::prelude::*;
///
/// let a = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3])?;
/// let b = a.permute(&[1, 0])?; // Zero-copy, shares storage with a
/// assert!(b.shares_storage(&a));
/// assert_eq!(b.get(&[2, 1])?, 6.0);
/// # Ok::<(), pixr::error::Error>(())
/// ```
#[derive(Clone)]
pub struct Tensor {
    /// Typed element buffer
    storage: Storage,
    /// Shape, strides, offset
    layout: Layout,
}

impl Tensor {
    // ===== Construction =====

    /// Create a tensor from storage and an explicit or derived layout
    ///
    /// When `strides` is `None` they are computed from `shape` and `format`.
    /// Explicit strides must have one entry per dimension, and every storage
    /// offset reachable through `shape`, `strides` and `offset` must lie
    /// inside `storage`.
    pub fn from_parts(
        storage: Storage,
        shape: &[usize],
        strides: Option<&[isize]>,
        offset: usize,
        format: MemoryFormat,
    ) -> Result<Self> {
        validate_dims(shape)?;
        let strides = match strides {
            Some(strides) => Strides::from(strides),
            None => Layout::compute_strides(shape, format)?,
        };
        let layout = Layout::new(Shape::from(shape), strides, offset)?;
        Self::from_layout(storage, layout)
    }

    /// Create a tensor from storage and a layout, checking storage bounds
    pub fn from_layout(storage: Storage, layout: Layout) -> Result<Self> {
        let (lo, hi) = layout.span()?;
        if lo < 0 || hi >= storage.len() as isize {
            return Err(Error::invalid_argument(
                "layout",
                format!(
                    "{layout:?} addresses offsets {lo}..={hi}, storage holds {} elements",
                    storage.len()
                ),
            ));
        }
        Ok(Self { storage, layout })
    }

    /// Zero-copy view sharing this tensor's storage
    fn view(&self, layout: Layout, op: &'static str) -> Self {
        trace!(op, shape = ?layout.shape(), strides = ?layout.strides(), "view");
        Self {
            storage: self.storage.clone(),
            layout,
        }
    }

    /// Create a zero-filled row-major tensor
    pub fn zeros(shape: &[usize], dtype: DType) -> Result<Self> {
        Self::zeros_with_format(shape, dtype, MemoryFormat::RowMajor)
    }

    /// Create a zero-filled tensor whose strides follow `format`
    pub fn zeros_with_format(shape: &[usize], dtype: DType, format: MemoryFormat) -> Result<Self> {
        let layout = Layout::with_format(shape, format)?;
        let storage = Storage::zeros(dtype, layout.elem_count());
        Ok(Self { storage, layout })
    }

    /// Wrap a caller-supplied buffer as a row-major tensor
    ///
    /// Fails with `TypeMismatch` if the buffer is not of `dtype`, and with
    /// `SizeMismatch` if its length differs from the shape's element count.
    pub fn wrap(buffer: Buffer, dtype: DType, shape: &[usize]) -> Result<Self> {
        let storage = Storage::wrap(buffer, dtype)?;
        let layout = Layout::contiguous(shape)?;
        if storage.len() != layout.elem_count() {
            return Err(Error::SizeMismatch {
                expected: layout.elem_count(),
                got: storage.len(),
            });
        }
        Ok(Self { storage, layout })
    }

    /// Create a row-major tensor that takes ownership of `data`
    pub fn from_vec<T: Element>(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        Self::wrap(T::into_buffer(data), T::DTYPE, shape)
    }

    /// Create a row-major tensor by copying `data`
    ///
    /// # Example
    ///
    /// ```
    /// # use pixr::prelude::*;
    /// let tensor = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[2, 2])?;
    /// assert_eq!(tensor.strides(), &[2, 1]);
    /// # Ok::<(), pixr::error::Error>(())
    /// ```
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize]) -> Result<Self> {
        Self::from_vec(data.to_vec(), shape)
    }

    /// Rebuild a tensor from raw little-endian bytes, a type code, and a shape
    ///
    /// This is the inverse of [`Tensor::to_le_bytes`] paired with
    /// [`DType::type_code`].
    pub fn from_le_bytes(bytes: &[u8], type_code: i32, shape: &[usize]) -> Result<Self> {
        let dtype = DType::from_type_code(type_code)?;
        let storage = Storage::from_le_bytes(bytes, dtype)?;
        let layout = Layout::contiguous(shape)?;
        if storage.len() != layout.elem_count() {
            return Err(Error::SizeMismatch {
                expected: layout.elem_count(),
                got: storage.len(),
            });
        }
        Ok(Self { storage, layout })
    }

    // ===== Accessors =====

    /// Get the storage
    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Get the layout
    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    /// Get the base offset into storage
    #[inline]
    pub fn offset(&self) -> usize {
        self.layout.offset()
    }

    /// Get the number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Get the total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.layout.elem_count()
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Check if the tensor is contiguous in memory
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// Check whether two tensors view the same storage buffer
    #[inline]
    pub fn shares_storage(&self, other: &Tensor) -> bool {
        self.storage.ptr_eq(&other.storage)
    }

    // ===== Element Access =====

    /// Read the element at a full index tuple, widened to f64
    pub fn get(&self, indices: &[usize]) -> Result<f64> {
        let offset = self.layout.index(indices)?;
        self.storage.get(offset)
    }

    /// Read the element at a full index tuple without widening
    pub fn get_exact<T: Element>(&self, indices: &[usize]) -> Result<T> {
        let offset = self.layout.index(indices)?;
        self.storage.get_exact(offset)
    }

    /// Write the element at a full index tuple (in place)
    ///
    /// Narrowing follows the storage policy. If the storage is shared with
    /// another view, this tensor is first detached onto a private copy.
    pub fn set(&mut self, indices: &[usize], value: f64) -> Result<()> {
        let offset = self.layout.index(indices)?;
        self.storage.set(offset, value)
    }

    /// Mutable access to the storage buffer for in-place numeric operations
    pub(crate) fn buffer_mut(&mut self) -> &mut Buffer {
        self.storage.make_mut()
    }

    /// Borrow the elements of a contiguous tensor as a dense typed slice
    ///
    /// The slice covers exactly the viewed elements, in row-major order.
    pub fn contiguous_slice<T: Element>(&self) -> Result<&[T]> {
        if !self.is_contiguous() {
            return Err(Error::NotContiguous);
        }
        let data = self.storage.as_slice::<T>()?;
        let start = self.offset();
        Ok(&data[start..start + self.numel()])
    }

    // ===== View Operations (Zero-Copy) =====

    /// Permute dimensions (zero-copy)
    ///
    /// Result dimension `i` is input dimension `perm[i]`. `perm` must be a
    /// bijection over `0..ndim`.
    ///
    /// ```
    /// # use pixr::prelude::*;
    /// let t = Tensor::zeros(&[2, 3, 4], DType::F32)?;
    /// let p = t.permute(&[2, 0, 1])?;
    /// assert_eq!(p.shape(), &[4, 2, 3]);
    /// assert_eq!(p.strides(), &[1, 12, 4]);
    /// # Ok::<(), pixr::error::Error>(())
    /// ```
    pub fn permute(&self, perm: &[usize]) -> Result<Self> {
        Ok(self.view(self.layout.permute(perm)?, "permute"))
    }

    /// Swap two dimensions (zero-copy)
    pub fn transpose(&self, dim0: usize, dim1: usize) -> Result<Self> {
        let ndim = self.ndim();
        for dim in [dim0, dim1] {
            if dim >= ndim {
                return Err(Error::out_of_range(dim, ndim));
            }
        }
        let mut perm: Vec<usize> = (0..ndim).collect();
        perm.swap(dim0, dim1);
        self.permute(&perm)
    }

    /// Remove dimensions of size 1 (zero-copy)
    ///
    /// See [`Layout::squeeze`] for the exact rules.
    pub fn squeeze(&self, dim: Option<usize>) -> Result<Self> {
        Ok(self.view(self.layout.squeeze(dim)?, "squeeze"))
    }

    /// Insert a dimension of size 1 at `dim` (zero-copy)
    pub fn unsqueeze(&self, dim: usize) -> Result<Self> {
        Ok(self.view(self.layout.unsqueeze(dim)?, "unsqueeze"))
    }

    /// Reshape to a new shape (zero-copy, contiguous tensors only)
    ///
    /// Fails with `NotContiguous` on a strided view rather than copying;
    /// call [`Tensor::contiguous`] first.
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        Ok(self.view(self.layout.reshape(shape)?, "reshape"))
    }

    /// Reshape with at most one `-1` wildcard dimension inferred from the
    /// element count
    pub fn reshape_infer(&self, shape: &[isize]) -> Result<Self> {
        let resolved = infer_reshape(self.numel(), shape)?;
        self.reshape(&resolved)
    }

    /// Flatten to 1D (zero-copy, contiguous tensors only)
    pub fn flatten(&self) -> Result<Self> {
        self.reshape(&[self.numel()])
    }

    /// Narrow a dimension to `length` elements starting at `start` (zero-copy)
    pub fn narrow(&self, dim: usize, start: usize, length: usize) -> Result<Self> {
        Ok(self.view(self.layout.narrow(dim, start, length)?, "narrow"))
    }

    // ===== Materializing Operations =====

    /// Make tensor contiguous (copy if needed)
    ///
    /// If the tensor is already contiguous, returns a view sharing the same
    /// storage, so repeated calls never allocate. Otherwise gathers every
    /// element in row-major order into new storage.
    pub fn contiguous(&self) -> Self {
        if self.is_contiguous() {
            return self.clone();
        }
        debug!(shape = ?self.shape(), strides = ?self.strides(), dtype = %self.dtype(), "gathering strided view");
        self.gather()
    }

    /// Copy into new contiguous storage, even if already contiguous
    pub fn deep_clone(&self) -> Self {
        debug!(shape = ?self.shape(), dtype = %self.dtype(), "deep clone");
        self.gather()
    }

    fn gather(&self) -> Self {
        let buffer = dispatch_buffer!(self.storage.buffer(), data => {
            Element::into_buffer(gather_strided(data, &self.layout))
        });
        Self {
            storage: Storage::from_buffer(buffer),
            layout: Layout::row_major(self.shape()),
        }
    }

    // ===== Data Access =====

    /// Copy the viewed elements to a Vec in row-major order
    ///
    /// `T` must match the tensor dtype. Works for strided views.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        let data = self.storage.as_slice::<T>()?;
        Ok(gather_strided(data, &self.layout))
    }

    /// Copy the viewed elements to a Vec<f64> in row-major order
    pub fn to_f64_vec(&self) -> Vec<f64> {
        dispatch_buffer!(self.storage.buffer(), data => {
            self.layout.offsets().map(|offset| data[offset].to_f64()).collect()
        })
    }

    /// Raw little-endian bytes of a contiguous tensor
    ///
    /// Together with [`Tensor::shape`] and [`DType::type_code`] this is the
    /// complete transport form of a tensor.
    pub fn to_le_bytes(&self) -> Result<Vec<u8>> {
        if !self.is_contiguous() {
            return Err(Error::NotContiguous);
        }
        let mut out = Vec::with_capacity(self.numel() * self.dtype().size_in_bytes());
        dispatch_dtype!(self.dtype(), T => {
            let data = self.contiguous_slice::<T>()?;
            if cfg!(target_endian = "little") {
                out.extend_from_slice(bytemuck::cast_slice(data));
            } else {
                for &value in data {
                    value.write_le(&mut out);
                }
            }
        });
        Ok(out)
    }
}

/// Resolve a reshape target containing at most one `-1` wildcard
///
/// The wildcard takes whatever size makes the element counts agree. More
/// than one wildcard, any other negative or zero entry, or a count that does
/// not divide evenly is rejected with `InvalidParameter`.
pub fn infer_reshape(numel: usize, shape: &[isize]) -> Result<Vec<usize>> {
    let mut wildcard = None;
    let mut known = 1usize;
    for (i, &dim) in shape.iter().enumerate() {
        match dim {
            -1 if wildcard.is_some() => {
                return Err(Error::invalid_parameter(
                    "shape",
                    format!("{shape:?}"),
                    "only one dimension can be inferred",
                ));
            }
            -1 => wildcard = Some(i),
            d if d > 0 => known *= d as usize,
            _ => {
                return Err(Error::invalid_parameter(
                    "shape",
                    format!("{shape:?}"),
                    format!("dimension {i} must be positive or -1"),
                ));
            }
        }
    }

    let mut resolved: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
    if let Some(i) = wildcard {
        if numel % known != 0 {
            return Err(Error::invalid_parameter(
                "shape",
                format!("{shape:?}"),
                format!("cannot infer a dimension: {numel} elements do not divide by {known}"),
            ));
        }
        resolved[i] = numel / known;
    }
    Ok(resolved)
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .field("offset", &self.offset())
            .field("dtype", &self.dtype())
            .field("contiguous", &self.is_contiguous())
            .finish()
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor({:?}, dtype={})", self.shape(), self.dtype())
    }
}
