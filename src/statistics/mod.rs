//! Statistical computations and parallel reduction operations
//!
//! This module provides the masked reduction kernels behind the cube-level
//! statistics (flux, RMS, variance, extrema) and the NaN-aware axis sums used by
//! region stacking.
//!
//! # Organization
//!
//! - [`operations`]: scalar reductions over valid samples
//! - [`parallel`]: parallel computation kernels

pub mod operations;
pub mod parallel;

// Re-export the main types and functions for convenience
pub use operations::{reduce, StatOperation};
pub use parallel::{
    masked_argmax, masked_argmin, masked_count, masked_std, masked_sum, masked_sum_squares,
    nan_sum_axis,
};
