//! Affine normalization of raw sample arrays
//!
//! Stateless helpers mirroring the cube-level standardize/unstandardize for code
//! that works on bare arrays with no mapper attached. NaN samples are excluded
//! from the minimum and the sum but are carried through the arithmetic untouched.

use crate::errors::{CubeError, Result};
use ndarray::Array3;

/// Parameters recovered by [`standardize`], needed to reverse it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardizeParams {
    /// Minimum of the original data, subtracted first.
    pub y_min: f32,
    /// Sum of the shifted data, divided second.
    pub y_factor: f32,
}

/// Shifts `data` to a zero minimum, then scales it to unit sum.
///
/// The order matters: the factor is the sum of the *shifted* data, so the inverse
/// is `data * y_factor + y_min`.
///
/// # Errors
///
/// Returns `EmptyReduction` when every sample is NaN and `ZeroDivision` when the
/// shifted data sums to zero (the data is left shifted but unscaled in that
/// case).
pub fn standardize(data: &mut Array3<f32>) -> Result<StandardizeParams> {
    let y_min = data
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f32::INFINITY, f32::min);
    if y_min == f32::INFINITY {
        return Err(CubeError::EmptyReduction {
            op: "standardize".to_string(),
        });
    }
    data.mapv_inplace(|v| v - y_min);
    let y_factor = data
        .iter()
        .filter(|v| !v.is_nan())
        .map(|&v| f64::from(v))
        .sum::<f64>() as f32;
    if y_factor == 0.0 {
        return Err(CubeError::ZeroDivision {
            op: "standardize".to_string(),
        });
    }
    data.mapv_inplace(|v| v / y_factor);
    Ok(StandardizeParams { y_min, y_factor })
}

/// Reverses [`standardize`]: `data * y_factor + y_min`.
///
/// # Errors
///
/// Returns `ZeroDivision` for a zero normalization factor.
pub fn unstandardize(data: &mut Array3<f32>, params: &StandardizeParams) -> Result<()> {
    if params.y_factor == 0.0 {
        return Err(CubeError::ZeroDivision {
            op: "unstandardize".to_string(),
        });
    }
    data.mapv_inplace(|v| v * params.y_factor + params.y_min);
    Ok(())
}
