//! Memory operation kernels (strided gather, cast)

use crate::dtype::Element;
use crate::tensor::Layout;

/// Gather the elements addressed by `layout` into a new row-major vector
///
/// Walks every index tuple in row-major order, reading through the layout's
/// strides and writing sequentially. This is the one full O(numel) copy used
/// to materialize strided views.
pub fn gather_strided<T: Element>(src: &[T], layout: &Layout) -> Vec<T> {
    if layout.is_contiguous() {
        let start = layout.offset();
        return src[start..start + layout.elem_count()].to_vec();
    }
    layout.offsets().map(|offset| src[offset]).collect()
}

/// Convert elements between dtypes through f64
///
/// Narrowing follows [`Element::from_f64`]: integer targets round and clamp.
pub fn cast_kernel<S: Element, D: Element>(src: &[S]) -> Vec<D> {
    src.iter().map(|&v| D::from_f64(v.to_f64())).collect()
}
