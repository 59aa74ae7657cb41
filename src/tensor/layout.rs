//! Layout: shape, strides, and offset for tensor memory layout

use super::shape::{validate_dims, Shape, STACK_DIMS};
use super::strides::Strides;
use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;

/// Physical element ordering used to derive strides at creation time
///
/// The format is only a hint for [`Layout::compute_strides`]; once a layout
/// exists, its strides are the single source of truth.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MemoryFormat {
    /// Row-major (C-order): last dimension varies fastest
    #[default]
    RowMajor,
    /// Channel-fastest ordering for CHW (rank 3) and NCHW (rank 4) shapes
    ChannelsLast,
}

impl MemoryFormat {
    /// Index of the channel axis for a shape of rank `ndim`, if the format
    /// applies to that rank
    pub const fn channel_axis(ndim: usize) -> Option<usize> {
        match ndim {
            3 => Some(0),
            4 => Some(1),
            _ => None,
        }
    }
}

/// Layout describes the memory layout of a tensor
///
/// A tensor's elements are stored in a contiguous buffer, but not necessarily
/// in row-major order. The layout specifies how to compute the memory address
/// of any element given its indices.
///
/// Address of element at indices [i0, i1, ..., in]:
///   offset + i0 * strides[0] + i1 * strides[1] + ... + in * strides[n]
///
/// Layouts are immutable. Contiguity is evaluated once when the layout is
/// built and cached in the struct.
#[derive(Clone, PartialEq, Eq)]
pub struct Layout {
    /// Shape: size along each dimension
    shape: Shape,
    /// Strides: offset (in elements) between consecutive elements along each dimension
    strides: Strides,
    /// Offset: starting element index in the underlying storage
    offset: usize,
    /// Row-major contiguity of `shape` + `strides`
    contiguous: bool,
}

impl Layout {
    /// Create a new contiguous (row-major/C-order) layout from a shape
    ///
    /// # Example
    /// ```
    /// use pixr::tensor::Layout;
    /// let layout = Layout::contiguous(&[2, 3, 4]).unwrap();
    /// assert_eq!(layout.shape(), &[2, 3, 4]);
    /// assert_eq!(layout.strides(), &[12, 4, 1]);
    /// ```
    pub fn contiguous(shape: &[usize]) -> Result<Self> {
        Self::with_format(shape, MemoryFormat::RowMajor)
    }

    /// Create a layout for `shape` with strides derived from `format`
    pub fn with_format(shape: &[usize], format: MemoryFormat) -> Result<Self> {
        validate_dims(shape)?;
        let strides = Self::compute_strides(shape, format)?;
        Ok(Self::from_raw(Shape::from(shape), strides, 0))
    }

    /// Create a layout with explicit shape, strides, and offset
    ///
    /// Storage bounds are not known here; [`crate::tensor::Tensor`] checks
    /// them against [`Layout::span`].
    pub fn new(shape: Shape, strides: Strides, offset: usize) -> Result<Self> {
        shape.validate()?;
        if strides.len() != shape.ndim() {
            return Err(Error::invalid_argument(
                "strides",
                format!(
                    "expected {} strides for shape {}, got {}",
                    shape.ndim(),
                    shape,
                    strides.len()
                ),
            ));
        }
        Ok(Self::from_raw(shape, strides, offset))
    }

    /// Row-major layout for a shape taken from an existing tensor
    pub(crate) fn row_major(shape: &[usize]) -> Self {
        Self::from_raw(Shape::from(shape), row_major_strides(shape), 0)
    }

    /// Build a layout from already-validated parts
    fn from_raw(shape: Shape, strides: Strides, offset: usize) -> Self {
        let contiguous = is_contiguous(&shape, &strides);
        Self {
            shape,
            strides,
            offset,
            contiguous,
        }
    }

    /// Compute strides for a shape under the given memory format
    ///
    /// Row-major: `stride[last] = 1`, `stride[d] = stride[d + 1] * shape[d + 1]`.
    ///
    /// Channels-last: the channel axis (0 for CHW, 1 for NCHW) gets stride 1
    /// and the remaining axes get row-major strides as if the channel axis
    /// were moved to the end. Any other rank is rejected.
    pub fn compute_strides(shape: &[usize], format: MemoryFormat) -> Result<Strides> {
        match format {
            MemoryFormat::RowMajor => Ok(row_major_strides(shape)),
            MemoryFormat::ChannelsLast => {
                let channel = MemoryFormat::channel_axis(shape.len()).ok_or(
                    Error::UnsupportedLayout {
                        format,
                        ndim: shape.len(),
                    },
                )?;

                let mut strides = Strides::filled(0, shape.len());
                strides.set(channel, 1);
                let mut stride = shape[channel] as isize;
                for d in (0..shape.len()).rev().filter(|&d| d != channel) {
                    strides.set(d, stride);
                    stride *= shape[d] as isize;
                }
                Ok(strides)
            }
        }
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Get the offset
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Total number of elements
    #[inline]
    pub fn elem_count(&self) -> usize {
        self.shape.numel()
    }

    /// Check if memory is contiguous (row-major order)
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.contiguous
    }

    /// Smallest and largest storage offsets reachable through this layout
    ///
    /// Fails with `InvalidArgument` when an offset does not fit in `isize`.
    pub fn span(&self) -> Result<(isize, isize)> {
        let overflow = || {
            Error::invalid_argument(
                "layout",
                format!("{self:?} addresses offsets outside the isize range"),
            )
        };
        let base = isize::try_from(self.offset).map_err(|_| overflow())?;
        self.shape.iter().zip(self.strides.iter()).try_fold(
            (base, base),
            |(lo, hi), (&dim, &stride)| {
                let extent = (dim as isize - 1)
                    .checked_mul(stride)
                    .ok_or_else(overflow)?;
                let lo = lo.checked_add(extent.min(0)).ok_or_else(overflow)?;
                let hi = hi.checked_add(extent.max(0)).ok_or_else(overflow)?;
                Ok((lo, hi))
            },
        )
    }

    /// Whether distinct indices always address distinct storage offsets
    ///
    /// Conservative: axes are ordered by stride magnitude and each stride
    /// must exceed the reach of all smaller axes. A `false` result means the
    /// layout may alias, e.g. a broadcast axis with stride 0.
    pub fn is_non_overlapping(&self) -> bool {
        let mut axes: SmallVec<[(usize, usize); STACK_DIMS]> = self
            .shape
            .iter()
            .zip(self.strides.iter())
            .filter(|&(&dim, _)| dim > 1)
            .map(|(&dim, &stride)| (stride.unsigned_abs(), dim))
            .collect();
        axes.sort_unstable();

        let mut reach = 0usize;
        for (stride, dim) in axes {
            if stride <= reach {
                return false;
            }
            reach = reach.saturating_add(stride.saturating_mul(dim - 1));
        }
        true
    }

    /// Compute the storage offset for a full index tuple
    pub fn index(&self, indices: &[usize]) -> Result<usize> {
        if indices.len() != self.ndim() {
            return Err(Error::invalid_argument(
                "indices",
                format!(
                    "expected {} indices for shape {}, got {}",
                    self.ndim(),
                    self.shape,
                    indices.len()
                ),
            ));
        }

        let mut linear = self.offset as isize;
        for ((&idx, &dim), &stride) in indices
            .iter()
            .zip(self.shape.iter())
            .zip(self.strides.iter())
        {
            if idx >= dim {
                return Err(Error::out_of_range(idx, dim));
            }
            linear += idx as isize * stride;
        }

        Ok(linear as usize)
    }

    /// Iterate storage offsets of every element in row-major index order
    pub fn offsets(&self) -> StridedOffsets<'_> {
        StridedOffsets::new(&self.shape, &self.strides, self.offset)
    }

    /// Create a permuted layout
    ///
    /// `perm` must be a bijection over `0..ndim`. Result dimension `i` is
    /// input dimension `perm[i]`; the identity permutation reproduces the
    /// input exactly.
    pub fn permute(&self, perm: &[usize]) -> Result<Self> {
        validate_permutation(perm, self.ndim())?;

        let shape: Shape = perm.iter().map(|&p| self.shape[p]).collect();
        let strides: Strides = perm.iter().map(|&p| self.strides[p]).collect();
        Ok(Self::from_raw(shape, strides, self.offset))
    }

    /// Create a reshaped layout
    ///
    /// Requires a contiguous layout: reshape never copies, so callers with a
    /// strided view must materialize it first.
    pub fn reshape(&self, new_shape: &[usize]) -> Result<Self> {
        if !self.contiguous {
            return Err(Error::NotContiguous);
        }
        validate_dims(new_shape)?;

        let new_count: usize = new_shape.iter().product();
        if new_count != self.elem_count() {
            return Err(Error::SizeMismatch {
                expected: self.elem_count(),
                got: new_count,
            });
        }

        Ok(Self::from_raw(
            Shape::from(new_shape),
            row_major_strides(new_shape),
            self.offset,
        ))
    }

    /// Create a squeezed layout (remove dimensions of size 1)
    ///
    /// With `Some(dim)` only that dimension is removed, and only if its size
    /// is 1; any other size leaves the layout unchanged. With `None` every
    /// size-1 dimension goes, except that an all-ones shape keeps its last
    /// dimension so the rank stays at least 1. Retained strides are copied
    /// verbatim.
    pub fn squeeze(&self, dim: Option<usize>) -> Result<Self> {
        match dim {
            Some(d) => {
                if d >= self.ndim() {
                    return Err(Error::out_of_range(d, self.ndim()));
                }
                if self.shape[d] != 1 || self.ndim() == 1 {
                    return Ok(self.clone());
                }
                let mut shape = self.shape.clone();
                let mut strides = self.strides.clone();
                shape.remove(d);
                strides.remove(d);
                Ok(Self::from_raw(shape, strides, self.offset))
            }
            None => {
                let mut shape = Shape::new();
                let mut strides = Strides::new();
                for (&s, &st) in self.shape.iter().zip(self.strides.iter()) {
                    if s != 1 {
                        shape.push(s);
                        strides.push(st);
                    }
                }
                if shape.ndim() == 0 {
                    let last = self.ndim() - 1;
                    shape.push(1);
                    strides.push(self.strides[last]);
                }
                Ok(Self::from_raw(shape, strides, self.offset))
            }
        }
    }

    /// Create an unsqueezed layout (insert a dimension of size 1 at `dim`)
    ///
    /// `dim` ranges over `0..=ndim`. The inserted stride is
    /// `stride[dim] * shape[dim]` of the dimension that follows it, or 1 when
    /// appended at the end, so the contiguity verdict does not change.
    pub fn unsqueeze(&self, dim: usize) -> Result<Self> {
        let ndim = self.ndim();
        if dim > ndim {
            return Err(Error::out_of_range(dim, ndim + 1));
        }

        let new_stride = if dim < ndim {
            self.strides[dim] * self.shape[dim] as isize
        } else {
            1
        };

        let mut shape = self.shape.clone();
        let mut strides = self.strides.clone();
        shape.insert(dim, 1);
        strides.insert(dim, new_stride);

        Ok(Self::from_raw(shape, strides, self.offset))
    }

    /// Create a narrowed layout: `length` elements of `dim` starting at `start`
    pub fn narrow(&self, dim: usize, start: usize, length: usize) -> Result<Self> {
        if dim >= self.ndim() {
            return Err(Error::out_of_range(dim, self.ndim()));
        }
        let size = self.shape[dim];
        if length == 0 {
            return Err(Error::invalid_parameter(
                "length",
                length,
                "narrowed length must be at least 1",
            ));
        }
        if start.checked_add(length).map_or(true, |end| end > size) {
            return Err(Error::invalid_parameter(
                "start",
                start,
                format!("range of {length} elements exceeds dimension {dim} of size {size}"),
            ));
        }

        let mut shape = self.shape.clone();
        shape.set(dim, length);
        let offset = self.offset as isize + start as isize * self.strides[dim];

        Ok(Self::from_raw(shape, self.strides.clone(), offset as usize))
    }
}

/// Row-major strides for a shape
pub(crate) fn row_major_strides(shape: &[usize]) -> Strides {
    let mut strides = Strides::filled(0, shape.len());
    let mut stride = 1isize;

    // Compute strides from last dimension to first
    for (d, &dim) in shape.iter().enumerate().rev() {
        strides.set(d, stride);
        stride *= dim as isize;
    }

    strides
}

/// Row-major contiguity test
///
/// Dimensions are scanned last to first. Size-1 dimensions are skipped, so
/// their stored stride never affects the verdict; every other stride must
/// equal the running product of the sizes after it.
pub fn is_contiguous(shape: &[usize], strides: &[isize]) -> bool {
    let mut expected = 1isize;
    for (&dim, &stride) in shape.iter().zip(strides.iter()).rev() {
        if dim == 1 {
            continue;
        }
        if stride != expected {
            return false;
        }
        expected *= dim as isize;
    }
    true
}

/// Check that `perm` is a bijection over `0..ndim`
pub fn validate_permutation(perm: &[usize], ndim: usize) -> Result<()> {
    if perm.len() != ndim {
        return Err(Error::invalid_argument(
            "perm",
            format!("expected {ndim} axes, got {}", perm.len()),
        ));
    }

    let mut seen: SmallVec<[bool; STACK_DIMS]> = SmallVec::from_elem(false, ndim);
    for &p in perm {
        if p >= ndim {
            return Err(Error::invalid_argument(
                "perm",
                format!("axis {p} out of range for rank {ndim}"),
            ));
        }
        if seen[p] {
            return Err(Error::invalid_argument(
                "perm",
                format!("axis {p} appears more than once"),
            ));
        }
        seen[p] = true;
    }
    Ok(())
}

/// Inverse of a permutation: `inverse[perm[i]] = i`
pub fn inverse_permutation(perm: &[usize]) -> Result<Vec<usize>> {
    validate_permutation(perm, perm.len())?;
    let mut inverse = vec![0; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        inverse[p] = i;
    }
    Ok(inverse)
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layout {{ shape: {:?}, strides: {:?}, offset: {} }}",
            self.shape.as_slice(),
            self.strides.as_slice(),
            self.offset
        )
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.shape.as_slice())
    }
}

/// Iterator over the storage offsets of a strided layout in row-major index order
pub struct StridedOffsets<'a> {
    shape: &'a [usize],
    strides: &'a [isize],
    index: SmallVec<[usize; STACK_DIMS]>,
    next: isize,
    remaining: usize,
}

impl<'a> StridedOffsets<'a> {
    fn new(shape: &'a [usize], strides: &'a [isize], offset: usize) -> Self {
        Self {
            shape,
            strides,
            index: SmallVec::from_elem(0, shape.len()),
            next: offset as isize,
            remaining: shape.iter().product(),
        }
    }
}

impl Iterator for StridedOffsets<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next;
        self.remaining -= 1;

        if self.remaining > 0 {
            // Odometer step: bump the last axis, carry into earlier ones
            for d in (0..self.shape.len()).rev() {
                self.index[d] += 1;
                self.next += self.strides[d];
                if self.index[d] < self.shape[d] {
                    break;
                }
                self.next -= self.strides[d] * self.shape[d] as isize;
                self.index[d] = 0;
            }
        }

        Some(current as usize)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for StridedOffsets<'_> {}
