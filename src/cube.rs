//! Masked astronomical data cubes
//!
//! A [`MaskedCube`] is a 3-D array of samples plus a validity mask, a shared
//! world-coordinate mapper, a physical unit tag, and a metadata card map. A
//! spectrum is a cube whose two spatial axes have size 1; an image is a cube
//! whose spectral axis has size 1. 4-D Stokes cubes are not supported.
//!
//! The mask marks invalid samples (`true` = invalid) and is derived from the
//! data's NaN pattern at construction. All mutation flows through methods that
//! keep data and mask coherent; there is no raw mutable access to the samples.

use crate::errors::{CubeError, Result};
use crate::filters::{self, Interpolation, ScaleFactor};
use crate::metadata::Metadata;
use crate::slab::{matching_slabs, resolve_slab, IndexVector, Slab};
use crate::standardize::StandardizeParams;
use crate::statistics;
use crate::wcs::{CoordinateMapper, WorldExtent};
use ndarray::{s, Array2, Array3, ArrayD, Zip};
use std::sync::Arc;

/// A 3-D array of astronomical samples with validity mask, coordinate mapper,
/// unit, and metadata.
#[derive(Debug, Clone)]
pub struct MaskedCube {
    data: Array3<f32>,
    mask: Array3<bool>,
    mapper: CoordinateMapper,
    unit: String,
    meta: Arc<Metadata>,
}

impl MaskedCube {
    /// Creates a cube from raw data; the mask is derived from the data's NaN
    /// pattern.
    pub fn new(
        data: Array3<f32>,
        mapper: CoordinateMapper,
        meta: Metadata,
        unit: impl Into<String>,
    ) -> Self {
        let mask = data.mapv(f32::is_nan);
        Self {
            data,
            mask,
            mapper,
            unit: unit.into(),
            meta: Arc::new(meta),
        }
    }

    /// Creates a cube with an explicit validity mask (`true` = invalid).
    ///
    /// NaN samples are marked invalid regardless of the given mask, so the
    /// NaN-coherence invariant holds for every cube.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` when mask and data shapes differ.
    pub fn with_mask(
        data: Array3<f32>,
        mask: Array3<bool>,
        mapper: CoordinateMapper,
        meta: Metadata,
        unit: impl Into<String>,
    ) -> Result<Self> {
        if mask.dim() != data.dim() {
            return Err(CubeError::ShapeMismatch {
                expected: data.shape().to_vec(),
                found: mask.shape().to_vec(),
            });
        }
        let mut mask = mask;
        Zip::from(&mut mask)
            .and(&data)
            .for_each(|m, v| *m = *m || v.is_nan());
        Ok(Self {
            data,
            mask,
            mapper,
            unit: unit.into(),
            meta: Arc::new(meta),
        })
    }

    /// The sample array. Invalid samples hold whatever value they were given
    /// (typically NaN); consult [`mask`](Self::mask) before trusting them.
    #[must_use]
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// The validity mask, `true` = invalid.
    #[must_use]
    pub fn mask(&self) -> &Array3<bool> {
        &self.mask
    }

    /// Replaces the sample array and re-derives the mask from its NaN pattern.
    pub fn set_data(&mut self, data: Array3<f32>) {
        self.mask = data.mapv(f32::is_nan);
        self.data = data;
    }

    #[must_use]
    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    #[must_use]
    pub fn meta(&self) -> &Metadata {
        &self.meta
    }

    /// Per-axis lengths, axis 0 slowest.
    #[must_use]
    pub fn shape(&self) -> [usize; 3] {
        let (n0, n1, n2) = self.data.dim();
        [n0, n1, n2]
    }

    /// Number of valid samples.
    #[must_use]
    pub fn count(&self) -> usize {
        statistics::masked_count(&self.mask)
    }

    /// A zero-filled cube of the same shape. The mapper and metadata are shared
    /// with this cube, not deep-copied.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self {
            data: Array3::zeros(self.data.raw_dim()),
            mask: Array3::from_elem(self.data.raw_dim(), false),
            mapper: self.mapper.clone(),
            unit: self.unit.clone(),
            meta: Arc::clone(&self.meta),
        }
    }

    /// Deep copy: data, mask, and metadata are duplicated; the mapper identity
    /// is shared, since transforms are immutable.
    #[must_use]
    pub fn copy(&self) -> Self {
        Self {
            data: self.data.clone(),
            mask: self.mask.clone(),
            mapper: self.mapper.clone(),
            unit: self.unit.clone(),
            meta: Arc::new((*self.meta).clone()),
        }
    }

    // Region extraction

    /// Extracts the sub-array for the requested window as an owned copy, with
    /// invalid samples set to NaN.
    #[must_use]
    pub fn cut(&self, lower: Option<[f64; 3]>, upper: Option<[f64; 3]>) -> Array3<f32> {
        let slab = resolve_slab(lower, upper, self.shape());
        self.region(&slab)
    }

    /// Sums the cut region along the given axis, excluding invalid samples.
    ///
    /// # Errors
    ///
    /// Returns an error if the axis is out of bounds.
    pub fn stack(
        &self,
        lower: Option<[f64; 3]>,
        upper: Option<[f64; 3]>,
        axis: usize,
    ) -> Result<ArrayD<f32>> {
        let region = self.region(&resolve_slab(lower, upper, self.shape())).into_dyn();
        statistics::nan_sum_axis(&region, axis)
    }

    fn region(&self, slab: &Slab) -> Array3<f32> {
        let sl = s![
            slab.start[0]..slab.stop[0],
            slab.start[1]..slab.stop[1],
            slab.start[2]..slab.stop[2]
        ];
        let mut out = self.data.slice(sl).to_owned();
        Zip::from(&mut out)
            .and(&self.mask.slice(sl))
            .for_each(|v, &invalid| {
                if invalid {
                    *v = f32::NAN;
                }
            });
        out
    }

    // Statistics

    /// Sum over all valid samples.
    #[must_use]
    pub fn flux(&self) -> f32 {
        statistics::masked_sum(&self.data, &self.mask) as f32
    }

    /// Root mean square over valid samples.
    ///
    /// # Errors
    ///
    /// Returns `EmptyReduction` on a fully masked cube.
    pub fn estimate_rms(&self) -> Result<f32> {
        statistics::reduce(&self.data, &self.mask, statistics::StatOperation::Rms)
    }

    /// Population standard deviation over valid samples.
    ///
    /// # Errors
    ///
    /// Returns `EmptyReduction` on a fully masked cube.
    pub fn variance(&self) -> Result<f32> {
        statistics::reduce(&self.data, &self.mask, statistics::StatOperation::Variance)
    }

    /// Maximum valid sample and its index; ties broken by first occurrence in
    /// row-major order.
    ///
    /// # Errors
    ///
    /// Returns `EmptyReduction` on a fully masked cube.
    pub fn max(&self) -> Result<(f32, IndexVector)> {
        statistics::masked_argmax(&self.data, &self.mask).ok_or_else(|| CubeError::EmptyReduction {
            op: statistics::StatOperation::Max.as_str().to_string(),
        })
    }

    /// Minimum valid sample and its index; ties broken by first occurrence in
    /// row-major order.
    ///
    /// # Errors
    ///
    /// Returns `EmptyReduction` on a fully masked cube.
    pub fn min(&self) -> Result<(f32, IndexVector)> {
        statistics::masked_argmin(&self.data, &self.mask).ok_or_else(|| CubeError::EmptyReduction {
            op: statistics::StatOperation::Min.as_str().to_string(),
        })
    }

    // In-place modification

    /// Shifts the data to a zero minimum, then scales it to unit sum.
    ///
    /// The normalization factor is computed *after* the minimum subtraction;
    /// [`unstandardize`](Self::unstandardize) reverses the two steps in the
    /// matching order.
    ///
    /// # Errors
    ///
    /// Returns `EmptyReduction` on a fully masked cube and `ZeroDivision` when
    /// the shifted data sums to zero.
    pub fn standardize(&mut self) -> Result<StandardizeParams> {
        let (y_min, _) = statistics::masked_argmin(&self.data, &self.mask).ok_or_else(|| {
            CubeError::EmptyReduction {
                op: "standardize".to_string(),
            }
        })?;
        self.data.mapv_inplace(|v| v - y_min);
        let y_factor = statistics::masked_sum(&self.data, &self.mask) as f32;
        if y_factor == 0.0 {
            return Err(CubeError::ZeroDivision {
                op: "standardize".to_string(),
            });
        }
        self.data.mapv_inplace(|v| v / y_factor);
        Ok(StandardizeParams { y_min, y_factor })
    }

    /// Reverses [`standardize`](Self::standardize): `data * y_factor + y_min`.
    ///
    /// # Errors
    ///
    /// Returns `ZeroDivision` for a zero normalization factor, which cannot
    /// correspond to any forward transform.
    pub fn unstandardize(&mut self, params: &StandardizeParams) -> Result<()> {
        if params.y_factor == 0.0 {
            return Err(CubeError::ZeroDivision {
                op: "unstandardize".to_string(),
            });
        }
        self.data
            .mapv_inplace(|v| v * params.y_factor + params.y_min);
        Ok(())
    }

    /// Adds a flux patch into the requested window.
    ///
    /// The destination slab is clamped to the cube and the matching patch
    /// sub-range selected per the alignment policy of
    /// [`matching_slabs`](crate::slab::matching_slabs). Invalid destination
    /// samples are left untouched; any NaN the addition introduces is marked
    /// invalid.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` when the patch cannot cover the visible window.
    pub fn add_flux(
        &mut self,
        patch: &Array3<f32>,
        lower: Option<[f64; 3]>,
        upper: Option<[f64; 3]>,
    ) -> Result<()> {
        let (n0, n1, n2) = patch.dim();
        let (dest, psl) = matching_slabs(self.shape(), [n0, n1, n2], lower, upper)?;
        let dsl = s![
            dest.start[0]..dest.stop[0],
            dest.start[1]..dest.stop[1],
            dest.start[2]..dest.stop[2]
        ];
        let fsl = s![
            psl.start[0]..psl.stop[0],
            psl.start[1]..psl.stop[1],
            psl.start[2]..psl.stop[2]
        ];
        Zip::from(&mut self.data.slice_mut(dsl))
            .and(&mut self.mask.slice_mut(dsl))
            .and(&patch.slice(fsl))
            .for_each(|d, m, p| {
                if !*m {
                    *d += *p;
                    if d.is_nan() {
                        *m = true;
                    }
                }
            });
        Ok(())
    }

    /// Overwrites the requested window with a flux patch.
    ///
    /// Same slab alignment as [`add_flux`](Self::add_flux); the destination mask
    /// is rewritten from the patch's NaN pattern, so replacement can both
    /// invalidate and revalidate samples.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` when the patch cannot cover the visible window.
    pub fn replace_flux(
        &mut self,
        patch: &Array3<f32>,
        lower: Option<[f64; 3]>,
        upper: Option<[f64; 3]>,
    ) -> Result<()> {
        let (n0, n1, n2) = patch.dim();
        let (dest, psl) = matching_slabs(self.shape(), [n0, n1, n2], lower, upper)?;
        let dsl = s![
            dest.start[0]..dest.stop[0],
            dest.start[1]..dest.stop[1],
            dest.start[2]..dest.stop[2]
        ];
        let fsl = s![
            psl.start[0]..psl.stop[0],
            psl.start[1]..psl.stop[1],
            psl.start[2]..psl.stop[2]
        ];
        Zip::from(&mut self.data.slice_mut(dsl))
            .and(&mut self.mask.slice_mut(dsl))
            .and(&patch.slice(fsl))
            .for_each(|d, m, p| {
                *d = *p;
                *m = p.is_nan();
            });
        Ok(())
    }

    // Resampling

    /// Resamples the data by a uniform or per-axis zoom factor, returning a new
    /// array.
    ///
    /// # Errors
    ///
    /// Returns `FilterError` for non-positive or non-finite factors.
    pub fn scale(
        &self,
        factor: ScaleFactor,
        interpolation: Interpolation,
    ) -> Result<Array3<f32>> {
        filters::zoom(&self.data, factor, interpolation)
    }

    /// Rotates each spatial plane about its center, returning a new array with
    /// NaN outside the rotated footprint.
    #[must_use]
    pub fn rotate(&self, angle_deg: f64, interpolation: Interpolation) -> Array3<f32> {
        filters::rotate(&self.data, angle_deg, interpolation)
    }

    // World coordinates

    /// World coordinate of a single index, native transform axis order.
    #[must_use]
    pub fn index_to_world(&self, index: IndexVector) -> [f64; 3] {
        self.mapper.index_to_world(index)
    }

    /// Clamped index corners of the world-space window `center +/- half_width`.
    #[must_use]
    pub fn index_from_window(
        &self,
        center: [f64; 3],
        half_width: [f64; 3],
    ) -> (IndexVector, IndexVector) {
        self.mapper.index_window(center, half_width, self.shape())
    }

    /// Cell-edge physical bounds of the whole cube.
    #[must_use]
    pub fn world_extent(&self) -> WorldExtent {
        self.mapper.world_extent(self.shape())
    }

    /// Axis type names from the transform.
    #[must_use]
    pub fn axis_names(&self) -> [String; 3] {
        self.mapper.axis_names()
    }

    /// Every integer index in the requested window as a dense 3xN grid, axis 2
    /// varying fastest.
    #[must_use]
    pub fn index_features(&self, lower: Option<[f64; 3]>, upper: Option<[f64; 3]>) -> Array2<f64> {
        let slab = resolve_slab(lower, upper, self.shape());
        self.mapper.index_features(&slab)
    }

    /// World coordinates of every integer index in the requested window, 3xN.
    #[must_use]
    pub fn features(&self, lower: Option<[f64; 3]>, upper: Option<[f64; 3]>) -> Array2<f64> {
        let slab = resolve_slab(lower, upper, self.shape());
        self.mapper.features(&slab)
    }

    /// Builds a FITS header/data unit from the cube's data and metadata.
    #[must_use]
    pub fn to_hdu(&self) -> fitrs::Hdu {
        crate::fits_io::cube_to_hdu(self)
    }
}
