//! Index clamping and slab resolution
//!
//! All region access on a cube goes through the types in this module: a requested
//! index window, possibly fractional, partial, or out of range, is resolved into a
//! [`Slab`] whose bounds are guaranteed to lie inside the array. Slabs are never
//! constructed ad hoc elsewhere, which keeps the clamping invariant in one place.

use crate::errors::{CubeError, Result};
use log::debug;

/// An integer index into a cube, one component per axis (axis 0 slowest).
pub type IndexVector = [usize; 3];

/// A resolved, clamped per-axis index range.
///
/// Invariant: `start[axis] <= stop[axis] <= shape[axis]` for the shape the slab
/// was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slab {
    pub start: IndexVector,
    pub stop: IndexVector,
}

impl Slab {
    /// The per-axis extent of the slab.
    #[must_use]
    pub fn shape(&self) -> IndexVector {
        [
            self.stop[0] - self.start[0],
            self.stop[1] - self.start[1],
            self.stop[2] - self.start[2],
        ]
    }

    /// Number of samples covered by the slab.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    /// True when at least one axis has zero extent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clamps each component of `vector` into `[0, shape[axis]]`.
///
/// Fractional components are truncated toward zero before clamping. Out-of-range
/// components are corrected silently; this is a permissive policy, not a
/// validation boundary, so no error is ever raised here.
#[must_use]
pub fn fix_limits(vector: [f64; 3], shape: [usize; 3]) -> IndexVector {
    let mut fixed = [0usize; 3];
    for axis in 0..3 {
        let v = vector[axis].trunc();
        fixed[axis] = if v < 0.0 || v.is_nan() {
            debug!(
                "index {} below bounds on axis {}, clamped to 0",
                vector[axis], axis
            );
            0
        } else if v > shape[axis] as f64 {
            debug!(
                "index {} beyond bounds on axis {}, clamped to {}",
                vector[axis], axis, shape[axis]
            );
            shape[axis]
        } else {
            v as usize
        };
    }
    fixed
}

/// Resolves a requested index window against an array shape.
///
/// An unspecified `lower` defaults to the origin and an unspecified `upper` to the
/// full shape, so `resolve_slab(None, None, shape)` covers the whole volume. Both
/// bounds are clamped independently through [`fix_limits`]. An inverted request
/// (`lower > upper` on some axis) collapses to an empty slab positioned at the
/// clamped lower bound.
#[must_use]
pub fn resolve_slab(lower: Option<[f64; 3]>, upper: Option<[f64; 3]>, shape: [usize; 3]) -> Slab {
    let lower = lower.unwrap_or([0.0; 3]);
    let upper = upper.unwrap_or([shape[0] as f64, shape[1] as f64, shape[2] as f64]);
    let start = fix_limits(lower, shape);
    let mut stop = fix_limits(upper, shape);
    for axis in 0..3 {
        if stop[axis] < start[axis] {
            stop[axis] = start[axis];
        }
    }
    Slab { start, stop }
}

/// Computes the destination slab and the matching patch-local slab for inserting
/// `patch` into a destination array at the requested window.
///
/// When the destination slab was clamped at a boundary, the visible part of the
/// patch is selected by an asymmetric alignment policy:
///
/// - clamped at the lower boundary (`start == 0`): the patch is right-aligned to
///   the window end, so its lower bound becomes `patch_shape[axis] - stop[axis]`;
/// - clamped at the upper boundary (`stop == dest_shape[axis]`): the patch is
///   left-aligned, its upper bound measured from wherever the lower bound landed.
///
/// When both sides clamp on the same axis, right-alignment takes precedence. This
/// is the mechanism by which a flux patch centered outside the cube is cropped to
/// the visible window. A patch whose extent cannot cover the destination slab is
/// rejected with `ShapeMismatch` before any element-wise combination.
pub fn matching_slabs(
    dest_shape: [usize; 3],
    patch_shape: [usize; 3],
    lower: Option<[f64; 3]>,
    upper: Option<[f64; 3]>,
) -> Result<(Slab, Slab)> {
    let dest = resolve_slab(lower, upper, dest_shape);
    let mut fl = [0usize; 3];
    let mut fu = patch_shape;
    for axis in 0..3 {
        let extent = dest.stop[axis] - dest.start[axis];
        if dest.start[axis] == 0 {
            fl[axis] = patch_shape[axis].checked_sub(dest.stop[axis]).ok_or_else(|| {
                CubeError::ShapeMismatch {
                    expected: dest.shape().to_vec(),
                    found: patch_shape.to_vec(),
                }
            })?;
            fu[axis] = patch_shape[axis];
        }
        if dest.stop[axis] == dest_shape[axis] {
            fu[axis] = fl[axis] + extent;
        }
        if fu[axis] > patch_shape[axis] || fu[axis] - fl[axis] != extent {
            return Err(CubeError::ShapeMismatch {
                expected: dest.shape().to_vec(),
                found: patch_shape.to_vec(),
            });
        }
    }
    Ok((dest, Slab { start: fl, stop: fu }))
}
