//! Resampling, rotation, and thresholding filters
//!
//! Small self-contained kernels standing in for an external N-D image-processing
//! library. Interpolation is nearest-neighbour or linear; samples falling outside
//! the input footprint come back as NaN so downstream masking picks them up.

use crate::errors::{CubeError, Result};
use ndarray::Array3;

/// Zoom factor for [`zoom`], uniform or per-axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleFactor {
    /// Same factor on every axis.
    Uniform(f64),
    /// One factor per axis, axis 0 first.
    PerAxis([f64; 3]),
}

impl ScaleFactor {
    fn per_axis(self) -> [f64; 3] {
        match self {
            Self::Uniform(f) => [f, f, f],
            Self::PerAxis(f) => f,
        }
    }
}

/// Interpolation order for [`zoom`] and [`rotate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Nearest,
    Linear,
}

/// Resamples `data` by the given zoom factor.
///
/// Output axis lengths are `round(len * factor)`, at least 1. A uniform factor
/// of exactly 1.0 returns an unchanged copy.
///
/// # Errors
///
/// Returns `FilterError` for non-positive or non-finite factors.
pub fn zoom(data: &Array3<f32>, factor: ScaleFactor, interpolation: Interpolation) -> Result<Array3<f32>> {
    if let ScaleFactor::Uniform(f) = factor {
        if f == 1.0 {
            return Ok(data.clone());
        }
    }
    let f = factor.per_axis();
    if f.iter().any(|&x| !x.is_finite() || x <= 0.0) {
        return Err(CubeError::FilterError(format!(
            "zoom factor must be positive and finite, got {:?}",
            f
        )));
    }

    let (n0, n1, n2) = data.dim();
    let out_shape = (
        ((n0 as f64) * f[0]).round().max(1.0) as usize,
        ((n1 as f64) * f[1]).round().max(1.0) as usize,
        ((n2 as f64) * f[2]).round().max(1.0) as usize,
    );

    Ok(Array3::from_shape_fn(out_shape, |(i0, i1, i2)| {
        let src = [
            (i0 as f64 + 0.5) / f[0] - 0.5,
            (i1 as f64 + 0.5) / f[1] - 0.5,
            (i2 as f64 + 0.5) / f[2] - 0.5,
        ];
        sample(data, src, interpolation, true)
    }))
}

/// Rotates each spatial plane (axes 1 and 2) by `angle_deg` about its center.
///
/// The output has the same shape as the input; samples whose source falls
/// outside the plane are NaN. A zero angle returns an unchanged copy.
#[must_use]
pub fn rotate(data: &Array3<f32>, angle_deg: f64, interpolation: Interpolation) -> Array3<f32> {
    if angle_deg == 0.0 {
        return data.clone();
    }
    let (n0, n1, n2) = data.dim();
    let theta = angle_deg.to_radians();
    let (sin, cos) = (theta.sin(), theta.cos());
    let cy = (n1 as f64 - 1.0) / 2.0;
    let cx = (n2 as f64 - 1.0) / 2.0;

    Array3::from_shape_fn((n0, n1, n2), |(i0, i1, i2)| {
        // inverse rotation of the output coordinate picks the source sample
        let dy = i1 as f64 - cy;
        let dx = i2 as f64 - cx;
        let sy = cy + dy * cos - dx * sin;
        let sx = cx + dy * sin + dx * cos;
        sample(data, [i0 as f64, sy, sx], interpolation, false)
    })
}

/// Zeroes every sample at or below `threshold`; NaN samples are preserved.
#[must_use]
pub fn denoise(data: &Array3<f32>, threshold: f32) -> Array3<f32> {
    data.mapv(|v| if v.is_nan() || v > threshold { v } else { 0.0 })
}

fn sample(data: &Array3<f32>, src: [f64; 3], interpolation: Interpolation, clamp: bool) -> f32 {
    let shape = data.dim();
    let shape = [shape.0, shape.1, shape.2];
    match interpolation {
        Interpolation::Nearest => {
            let mut idx = [0usize; 3];
            for axis in 0..3 {
                let p = src[axis].round();
                if p < 0.0 || p > shape[axis] as f64 - 1.0 {
                    if !clamp {
                        return f32::NAN;
                    }
                    idx[axis] = p.max(0.0).min(shape[axis] as f64 - 1.0) as usize;
                } else {
                    idx[axis] = p as usize;
                }
            }
            data[[idx[0], idx[1], idx[2]]]
        }
        Interpolation::Linear => {
            let mut lo = [0usize; 3];
            let mut hi = [0usize; 3];
            let mut frac = [0.0f64; 3];
            for axis in 0..3 {
                let max = shape[axis] as f64 - 1.0;
                let p = if clamp {
                    src[axis].max(0.0).min(max)
                } else {
                    if src[axis] < 0.0 || src[axis] > max {
                        return f32::NAN;
                    }
                    src[axis]
                };
                lo[axis] = p.floor() as usize;
                hi[axis] = p.ceil().min(max) as usize;
                frac[axis] = p - p.floor();
            }
            let mut acc = 0.0f64;
            for (c0, w0) in [(lo[0], 1.0 - frac[0]), (hi[0], frac[0])] {
                for (c1, w1) in [(lo[1], 1.0 - frac[1]), (hi[1], frac[1])] {
                    for (c2, w2) in [(lo[2], 1.0 - frac[2]), (hi[2], frac[2])] {
                        let w = w0 * w1 * w2;
                        if w > 0.0 {
                            acc += w * f64::from(data[[c0, c1, c2]]);
                        }
                    }
                }
            }
            acc as f32
        }
    }
}
