//! Parallel computation kernels for masked reductions
//!
//! This module contains the actual computation logic behind cube statistics.
//! Every kernel excludes masked samples; accumulation happens in f64 to avoid
//! precision loss on large cubes.

use crate::errors::{CubeError, Result};
use crate::slab::IndexVector;
use ndarray::{Array3, ArrayD, Axis};
use rayon::prelude::*;

/// Number of valid (unmasked) samples.
#[must_use]
pub fn masked_count(mask: &Array3<bool>) -> usize {
    mask.iter().filter(|m| !**m).count()
}

/// Sum over valid samples.
#[must_use]
pub fn masked_sum(data: &Array3<f32>, mask: &Array3<bool>) -> f64 {
    valid_samples(data, mask).into_par_iter().sum()
}

/// Sum of squares over valid samples.
#[must_use]
pub fn masked_sum_squares(data: &Array3<f32>, mask: &Array3<bool>) -> f64 {
    valid_samples(data, mask)
        .into_par_iter()
        .map(|v| v * v)
        .sum()
}

/// Population standard deviation over valid samples, or `None` when the cube is
/// fully masked.
#[must_use]
pub fn masked_std(data: &Array3<f32>, mask: &Array3<bool>) -> Option<f64> {
    let samples = valid_samples(data, mask);
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as f64;
    let mean: f64 = samples.par_iter().sum::<f64>() / n;
    let sq_dev: f64 = samples.par_iter().map(|v| (v - mean) * (v - mean)).sum();
    Some((sq_dev / n).sqrt())
}

/// Maximum valid sample and its index; ties broken by first occurrence in
/// row-major order. `None` when the cube is fully masked.
#[must_use]
pub fn masked_argmax(data: &Array3<f32>, mask: &Array3<bool>) -> Option<(f32, IndexVector)> {
    masked_extreme(data, mask, true)
}

/// Minimum valid sample and its index; ties broken by first occurrence in
/// row-major order. `None` when the cube is fully masked.
#[must_use]
pub fn masked_argmin(data: &Array3<f32>, mask: &Array3<bool>) -> Option<(f32, IndexVector)> {
    masked_extreme(data, mask, false)
}

fn masked_extreme(
    data: &Array3<f32>,
    mask: &Array3<bool>,
    want_max: bool,
) -> Option<(f32, IndexVector)> {
    let (_, n1, n2) = data.dim();
    let candidates: Vec<(usize, f32)> = data
        .iter()
        .zip(mask.iter())
        .enumerate()
        .filter_map(|(flat, (v, m))| (!*m && !v.is_nan()).then(|| (flat, *v)))
        .collect();

    let best = candidates.into_par_iter().reduce_with(|a, b| {
        let better = if want_max { b.1 > a.1 } else { b.1 < a.1 };
        if better || (b.1 == a.1 && b.0 < a.0) {
            b
        } else {
            a
        }
    })?;

    let index = [best.0 / (n1 * n2), (best.0 / n2) % n1, best.0 % n2];
    Some((best.1, index))
}

/// Computes a sum along an axis using ndarray's `fold_axis`, skipping NaN samples
///
/// # Errors
///
/// Returns an error if the axis is out of bounds for the array.
pub fn nan_sum_axis(data: &ArrayD<f32>, axis: usize) -> Result<ArrayD<f32>> {
    if axis >= data.ndim() {
        return Err(CubeError::StatisticsError(format!(
            "Axis {axis} is out of bounds for array with {} dimensions",
            data.ndim()
        )));
    }

    let result = data.fold_axis(Axis(axis), 0.0_f32, |&acc, &x| {
        if x.is_nan() {
            acc // masked samples carry NaN and are excluded from the sum
        } else {
            acc + x
        }
    });

    Ok(result.into_dyn())
}

fn valid_samples(data: &Array3<f32>, mask: &Array3<bool>) -> Vec<f64> {
    data.iter()
        .zip(mask.iter())
        .filter_map(|(v, m)| (!*m).then(|| f64::from(*v)))
        .collect()
}
