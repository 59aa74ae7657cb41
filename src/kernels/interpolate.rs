//! Separable 2D resampling kernels (nearest, bilinear, bicubic)
//!
//! Every mode is expressed as a per-axis tap table: for each destination
//! coordinate along an axis, the source indices that contribute and their
//! weights. Tables are built once per resize and shared by every plane, then
//! a horizontal pass and a vertical pass apply them. All accumulation is in
//! f64; results are narrowed with [`Element::from_f64`], so integer outputs
//! round and clamp.

use crate::dtype::Element;
use crate::ops::InterpolationMode;

/// Cubic convolution coefficient
const CUBIC_A: f64 = -0.5;

/// Map a destination index to a continuous source coordinate
///
/// Half-pixel-center mapping is `(dst + 0.5) * (src / dst_size) - 0.5`;
/// corner-aligned mapping is `dst * (src - 1) / (dst_size - 1)`, or 0 when
/// the destination axis has a single element. The result is clamped into
/// `[0, src_size - 1]`.
#[inline]
pub fn source_coordinate(
    dst_index: usize,
    src_size: usize,
    dst_size: usize,
    align_corners: bool,
) -> f64 {
    let coord = if align_corners {
        if dst_size > 1 {
            dst_index as f64 * (src_size - 1) as f64 / (dst_size - 1) as f64
        } else {
            0.0
        }
    } else {
        (dst_index as f64 + 0.5) * (src_size as f64 / dst_size as f64) - 0.5
    };
    coord.clamp(0.0, (src_size - 1) as f64)
}

/// Cubic convolution weight for a tap at distance `t`
#[inline]
fn cubic_weight(t: f64) -> f64 {
    let t = t.abs();
    if t <= 1.0 {
        ((CUBIC_A + 2.0) * t - (CUBIC_A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((CUBIC_A * t - 5.0 * CUBIC_A) * t + 8.0 * CUBIC_A) * t - 4.0 * CUBIC_A
    } else {
        0.0
    }
}

/// Contributing source taps for every destination coordinate of one axis
#[derive(Debug, Clone, PartialEq)]
pub struct AxisTaps {
    taps: usize,
    index: Vec<usize>,
    weight: Vec<f64>,
}

impl AxisTaps {
    /// Build the tap table mapping `src_size` onto `dst_size`
    pub fn new(
        src_size: usize,
        dst_size: usize,
        mode: InterpolationMode,
        align_corners: bool,
    ) -> Self {
        let taps = mode.taps();
        let mut index = Vec::with_capacity(dst_size * taps);
        let mut weight = Vec::with_capacity(dst_size * taps);
        let last = src_size - 1;

        for d in 0..dst_size {
            match mode {
                InterpolationMode::Nearest => {
                    index.push((d * src_size / dst_size).min(last));
                    weight.push(1.0);
                }
                InterpolationMode::Bilinear => {
                    let coord = source_coordinate(d, src_size, dst_size, align_corners);
                    let i0 = coord.floor() as usize;
                    let frac = coord - i0 as f64;
                    index.extend([i0, (i0 + 1).min(last)]);
                    weight.extend([1.0 - frac, frac]);
                }
                InterpolationMode::Bicubic => {
                    let coord = source_coordinate(d, src_size, dst_size, align_corners);
                    let base = coord.floor();
                    let frac = coord - base;
                    for k in -1isize..=2 {
                        let i = (base as isize + k).clamp(0, last as isize);
                        index.push(i as usize);
                        weight.push(cubic_weight(k as f64 - frac));
                    }
                }
            }
        }

        Self {
            taps,
            index,
            weight,
        }
    }

    /// Number of destination coordinates
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len() / self.taps
    }

    /// Whether the table maps onto an empty axis
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Source indices and weights contributing to destination `d`
    #[inline]
    pub fn taps(&self, d: usize) -> (&[usize], &[f64]) {
        let range = d * self.taps..(d + 1) * self.taps;
        (&self.index[range.clone()], &self.weight[range])
    }
}

/// Resample `planes` stacked row-major planes of `src_h x src_w` elements
///
/// Returns `planes` planes of `dst_h x dst_w` elements in the same order.
/// `src` must hold exactly `planes * src_h * src_w` elements.
pub fn resize_planes<T: Element>(
    src: &[T],
    planes: usize,
    (src_h, src_w): (usize, usize),
    (dst_h, dst_w): (usize, usize),
    mode: InterpolationMode,
    align_corners: bool,
) -> Vec<T> {
    debug_assert_eq!(src.len(), planes * src_h * src_w);

    let rows = AxisTaps::new(src_h, dst_h, mode, align_corners);
    let cols = AxisTaps::new(src_w, dst_w, mode, align_corners);

    let mut out = Vec::with_capacity(planes * dst_h * dst_w);
    let mut horizontal = vec![0.0f64; src_h * dst_w];

    for plane in src.chunks_exact(src_h * src_w) {
        for (y, row) in plane.chunks_exact(src_w).enumerate() {
            let acc = &mut horizontal[y * dst_w..(y + 1) * dst_w];
            for (x, slot) in acc.iter_mut().enumerate() {
                let (index, weight) = cols.taps(x);
                *slot = index
                    .iter()
                    .zip(weight)
                    .map(|(&i, &w)| row[i].to_f64() * w)
                    .sum();
            }
        }

        for y in 0..dst_h {
            let (index, weight) = rows.taps(y);
            for x in 0..dst_w {
                let value: f64 = index
                    .iter()
                    .zip(weight)
                    .map(|(&i, &w)| horizontal[i * dst_w + x] * w)
                    .sum();
                out.push(T::from_f64(value));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bilinear_reference(src: &[f64], sw: usize, sy: f64, sx: f64, sh: usize) -> f64 {
        let y0 = sy.floor() as usize;
        let x0 = sx.floor() as usize;
        let y1 = (y0 + 1).min(sh - 1);
        let x1 = (x0 + 1).min(sw - 1);
        let fy = sy - y0 as f64;
        let fx = sx - x0 as f64;
        src[y0 * sw + x0] * (1.0 - fx) * (1.0 - fy)
            + src[y0 * sw + x1] * fx * (1.0 - fy)
            + src[y1 * sw + x0] * (1.0 - fx) * fy
            + src[y1 * sw + x1] * fx * fy
    }

    #[test]
    fn test_source_coordinate_half_pixel() {
        assert_eq!(source_coordinate(0, 2, 4, false), 0.0);
        assert_eq!(source_coordinate(1, 2, 4, false), 0.25);
        assert_eq!(source_coordinate(2, 2, 4, false), 0.75);
        assert_eq!(source_coordinate(3, 2, 4, false), 1.0);
    }

    #[test]
    fn test_source_coordinate_align_corners() {
        assert_eq!(source_coordinate(0, 3, 5, true), 0.0);
        assert_eq!(source_coordinate(2, 3, 5, true), 1.0);
        assert_eq!(source_coordinate(4, 3, 5, true), 2.0);
        assert_eq!(source_coordinate(0, 7, 1, true), 0.0);
    }

    #[test]
    fn test_cubic_weights_partition_unity() {
        for frac in [0.0, 0.1, 0.25, 0.5, 0.9] {
            let sum: f64 = (-1..=2).map(|k| cubic_weight(k as f64 - frac)).sum();
            assert!((sum - 1.0).abs() < 1e-12, "frac {frac}: sum {sum}");
        }
        assert_eq!(cubic_weight(0.0), 1.0);
        assert_eq!(cubic_weight(1.0), 0.0);
        assert_eq!(cubic_weight(2.0), 0.0);
    }

    #[test]
    fn test_nearest_taps() {
        let taps = AxisTaps::new(4, 2, InterpolationMode::Nearest, false);
        assert_eq!(taps.len(), 2);
        assert_eq!(taps.taps(0).0, &[0]);
        assert_eq!(taps.taps(1).0, &[2]);

        let taps = AxisTaps::new(2, 5, InterpolationMode::Nearest, true);
        let picked: Vec<usize> = (0..5).map(|d| taps.taps(d).0[0]).collect();
        assert_eq!(picked, vec![0, 0, 0, 1, 1]);
    }

    #[test]
    fn test_bilinear_upsample_matches_formula() {
        let src = [0.0f64, 1.0, 2.0, 3.0];
        let out = resize_planes(&src, 1, (2, 2), (4, 4), InterpolationMode::Bilinear, false);

        for y in 0..4 {
            for x in 0..4 {
                let sy = source_coordinate(y, 2, 4, false);
                let sx = source_coordinate(x, 2, 4, false);
                let expected = bilinear_reference(&src, 2, sy, sx, 2);
                assert!(
                    (out[y * 4 + x] - expected).abs() < 1e-12,
                    "({y}, {x}): {} vs {expected}",
                    out[y * 4 + x]
                );
            }
        }
    }

    #[test]
    fn test_single_pixel_constant_under_all_modes() {
        for mode in [
            InterpolationMode::Nearest,
            InterpolationMode::Bilinear,
            InterpolationMode::Bicubic,
        ] {
            for align in [false, true] {
                let out = resize_planes(&[7.25f32], 1, (1, 1), (3, 5), mode, align);
                assert_eq!(out, vec![7.25f32; 15], "{mode:?} align={align}");
            }
        }
    }

    #[test]
    fn test_bicubic_overshoot_float_vs_int() {
        let src = [0.0f32, 0.0, 255.0, 255.0];
        let out = resize_planes(&src, 1, (1, 4), (1, 8), InterpolationMode::Bicubic, false);
        assert!(out.iter().any(|&v| v < 0.0 || v > 255.0));

        let src = [0u8, 0, 255, 255];
        let out = resize_planes(&src, 1, (1, 4), (1, 8), InterpolationMode::Bicubic, false);
        assert_eq!(out.first(), Some(&0));
        assert_eq!(out.last(), Some(&255));
    }

    #[test]
    fn test_planes_resized_independently() {
        let src = [1.0f32, 1.0, 1.0, 1.0, 9.0, 9.0, 9.0, 9.0];
        let out = resize_planes(&src, 2, (2, 2), (3, 3), InterpolationMode::Bilinear, false);
        assert_eq!(&out[..9], &[1.0; 9]);
        assert_eq!(&out[9..], &[9.0; 9]);
    }
}
