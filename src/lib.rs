//! astrocube: masked astronomical data cube processing and analysis
//!
//! A Rust library for volumetric astronomical datasets (spectral cubes, images,
//! spectra) represented as 3-D arrays with a world-coordinate mapping, physical
//! units, and metadata. astrocube provides masked-value handling for invalid
//! samples, coordinate-aware region extraction, flux accumulation into
//! sub-regions, and parallel statistics.
//!
//! ## Key Features
//!
//! - **Masked Cubes**: NaN-derived validity masks excluded from every statistic
//! - **Region Extraction**: requested index windows are clamped and resolved
//!   into well-formed slabs before any read or write
//! - **World Coordinates**: pluggable pixel/world transforms with window
//!   resolution, cell-edge extents, and Doppler velocity ranges
//! - **Flux Combination**: boundary-aware patch alignment for adding or
//!   replacing flux in a sub-region
//! - **Parallel Statistics**: flux, RMS, variance, and extrema computed with
//!   Rayon reduction kernels
//! - **FITS Support**: write cubes with WCS and metadata cards, read them back
//!
//! ## Module Organization
//!
//! The library is organized into logical modules:
//!
//! - [`cube`]: the [`MaskedCube`](cube::MaskedCube) entity and its operations
//! - [`slab`]: index clamping, slab resolution, and patch alignment
//! - [`wcs`]: world-coordinate mapping and feature grids
//! - [`statistics`]: masked reduction kernels
//! - [`standardize`]: affine normalization of raw arrays
//! - [`filters`]: zoom/rotate/denoise filters
//! - [`fits_io`]: FITS serialization
//! - [`metadata`]: metadata cards and cube descriptions
//! - [`parallel`]: parallel processing configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use astrocube::prelude::*;
//! use ndarray::Array3;
//!
//! // A 3-D cube with a linear world-coordinate transform
//! let wcs = LinearWcs::new([45.0, -30.0, 1.42e9], [0.0, 0.0, 0.0], [-1e-4, 1e-4, 1e6])
//!     .with_rest_frequency(1.420405751e9);
//! let data = Array3::<f32>::zeros((16, 32, 32));
//! let cube = MaskedCube::new(data, wcs.into(), Metadata::new(), "Jy/beam");
//!
//! // Statistics over valid samples, and a coordinate-aware cut
//! let flux = cube.flux();
//! let region = cube.cut(Some([0.0, 8.0, 8.0]), Some([16.0, 24.0, 24.0]));
//! println!("flux {flux}, region shape {:?}", region.shape());
//! ```
//!
//! The library is designed to handle large cubes efficiently and to surface
//! clear errors for the failure modes that matter: zero normalization factors,
//! patch/destination shape mismatches, and reductions over fully masked data.

// Core modules
pub mod cube;
pub mod errors;
pub mod filters;
pub mod fits_io;
pub mod metadata;
pub mod parallel;
pub mod slab;
pub mod standardize;
pub mod statistics;
pub mod wcs;

// Direct re-exports for the public API
pub use cube::*;
pub use errors::*;
pub use filters::*;
pub use fits_io::*;
pub use metadata::*;
pub use parallel::*;
pub use slab::*;
pub use standardize::*;
pub use wcs::*;

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::cube::MaskedCube;
    pub use crate::errors::{CubeError, Result};
    pub use crate::filters::{Interpolation, ScaleFactor};
    pub use crate::metadata::{CubeSummary, Metadata};
    pub use crate::parallel::ParallelConfig;
    pub use crate::slab::{fix_limits, matching_slabs, resolve_slab, IndexVector, Slab};
    pub use crate::standardize::StandardizeParams;
    pub use crate::statistics::StatOperation;
    pub use crate::wcs::{CoordinateMapper, LinearWcs, WorldExtent, WorldTransform};
}
