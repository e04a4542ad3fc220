//! Core statistical operations
//!
//! This module defines the scalar reductions available over the valid samples of
//! a masked cube and dispatches them to the parallel kernels.

use crate::errors::{CubeError, Result};
use ndarray::Array3;

/// Supported scalar reductions over valid samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatOperation {
    /// Sum of valid samples
    Flux,
    /// Root mean square of valid samples
    Rms,
    /// Population standard deviation of valid samples
    Variance,
    /// Minimum valid sample
    Min,
    /// Maximum valid sample
    Max,
}

impl StatOperation {
    /// Get the string representation of the operation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flux => "flux",
            Self::Rms => "rms",
            Self::Variance => "variance",
            Self::Min => "minimum",
            Self::Max => "maximum",
        }
    }
}

/// Performs a scalar reduction over the valid samples of a masked array
///
/// # Errors
///
/// Returns `EmptyReduction` when the operation is undefined over a fully masked
/// array (`Flux` is the exception: an empty sum is zero).
pub fn reduce(data: &Array3<f32>, mask: &Array3<bool>, operation: StatOperation) -> Result<f32> {
    let empty = || CubeError::EmptyReduction {
        op: operation.as_str().to_string(),
    };
    match operation {
        StatOperation::Flux => Ok(super::parallel::masked_sum(data, mask) as f32),
        StatOperation::Rms => {
            let count = super::parallel::masked_count(mask);
            if count == 0 {
                return Err(empty());
            }
            let sum_sq = super::parallel::masked_sum_squares(data, mask);
            Ok((sum_sq / count as f64).sqrt() as f32)
        }
        StatOperation::Variance => super::parallel::masked_std(data, mask)
            .map(|v| v as f32)
            .ok_or_else(empty),
        StatOperation::Min => super::parallel::masked_argmin(data, mask)
            .map(|(v, _)| v)
            .ok_or_else(empty),
        StatOperation::Max => super::parallel::masked_argmax(data, mask)
            .map(|(v, _)| v)
            .ok_or_else(empty),
    }
}
