//! World-coordinate mapping between array indices and physical coordinates
//!
//! A [`CoordinateMapper`] wraps a pluggable [`WorldTransform`] and handles the two
//! conventions the rest of the crate relies on:
//!
//! - array axis order is the *reverse* of the transform's native axis order
//!   (a cube indexed `(freq, dec, ra)` maps to a transform speaking `(ra, dec,
//!   freq)`), and
//! - transforms are batch-capable: they accept a list of coordinate vectors and
//!   return a list of the same length.
//!
//! Mappers are cheap to clone and share one immutable transform; derived cubes
//! (`empty_like`, `copy`) hold the same transform identity rather than a deep copy.

use crate::slab::{fix_limits, IndexVector, Slab};
use ndarray::Array2;
use std::fmt;
use std::sync::Arc;

/// Speed of light in km/s, for the radio Doppler equivalence.
const SPEED_OF_LIGHT_KM_S: f64 = 2.997_924_58e5;

/// FITS-style summary of a transform, native axis order.
#[derive(Debug, Clone)]
pub struct WcsDescription {
    /// World coordinate at the reference pixel.
    pub crval: [f64; 3],
    /// Reference pixel, 0-based.
    pub crpix: [f64; 3],
    /// Per-axis cell widths in world units.
    pub cdelt: [f64; 3],
    /// Axis type names, e.g. `RA---SIN`, `DEC--SIN`, `FREQ`.
    pub ctype: [String; 3],
    /// Rest frequency in Hz for the spectral axis, if known.
    pub rest_frequency: Option<f64>,
}

/// Bidirectional pixel/world coordinate conversion.
///
/// Implementations are stateless from the crate's perspective and never mutated
/// through it. Coordinate vectors are in the transform's native axis order.
pub trait WorldTransform: fmt::Debug + Send + Sync {
    /// Converts 0-based pixel coordinates to world coordinates.
    fn pix_to_world(&self, pixels: &[[f64; 3]]) -> Vec<[f64; 3]>;

    /// Converts world coordinates to 0-based pixel coordinates.
    fn world_to_pix(&self, worlds: &[[f64; 3]]) -> Vec<[f64; 3]>;

    /// FITS-style description of the transform.
    fn description(&self) -> WcsDescription;
}

/// A linear world-coordinate transform (CRVAL/CRPIX/CDELT), the common case for
/// regridded cubes.
#[derive(Debug, Clone)]
pub struct LinearWcs {
    crval: [f64; 3],
    crpix: [f64; 3],
    cdelt: [f64; 3],
    ctype: [String; 3],
    rest_frequency: Option<f64>,
}

impl LinearWcs {
    /// Creates a linear transform with default axis type names.
    #[must_use]
    pub fn new(crval: [f64; 3], crpix: [f64; 3], cdelt: [f64; 3]) -> Self {
        Self {
            crval,
            crpix,
            cdelt,
            ctype: [
                "RA---SIN".to_string(),
                "DEC--SIN".to_string(),
                "FREQ".to_string(),
            ],
            rest_frequency: None,
        }
    }

    /// Sets the axis type names, native axis order.
    #[must_use]
    pub fn with_axis_names(mut self, ctype: [String; 3]) -> Self {
        self.ctype = ctype;
        self
    }

    /// Sets the rest frequency in Hz used for Doppler velocity conversion.
    #[must_use]
    pub fn with_rest_frequency(mut self, rest_frequency_hz: f64) -> Self {
        self.rest_frequency = Some(rest_frequency_hz);
        self
    }
}

impl WorldTransform for LinearWcs {
    fn pix_to_world(&self, pixels: &[[f64; 3]]) -> Vec<[f64; 3]> {
        pixels
            .iter()
            .map(|pix| {
                let mut world = [0.0; 3];
                for axis in 0..3 {
                    world[axis] = self.crval[axis] + (pix[axis] - self.crpix[axis]) * self.cdelt[axis];
                }
                world
            })
            .collect()
    }

    fn world_to_pix(&self, worlds: &[[f64; 3]]) -> Vec<[f64; 3]> {
        worlds
            .iter()
            .map(|world| {
                let mut pix = [0.0; 3];
                for axis in 0..3 {
                    pix[axis] = (world[axis] - self.crval[axis]) / self.cdelt[axis] + self.crpix[axis];
                }
                pix
            })
            .collect()
    }

    fn description(&self) -> WcsDescription {
        WcsDescription {
            crval: self.crval,
            crpix: self.crpix,
            cdelt: self.cdelt,
            ctype: self.ctype.clone(),
            rest_frequency: self.rest_frequency,
        }
    }
}

/// Physical-coordinate bounding box of an index volume.
#[derive(Debug, Clone)]
pub struct WorldExtent {
    /// Cell-edge world ranges in array axis order (axis 0 = spectral), reported
    /// corner-wise: a flipped coordinate axis may have `lower > upper`.
    pub ranges: [(f64, f64); 3],
    /// Spectral range converted to radio velocities in km/s, when the transform
    /// carries a rest frequency.
    pub velocity_km_s: Option<(f64, f64)>,
}

/// Shared, immutable handle on a world-coordinate transform.
#[derive(Debug, Clone)]
pub struct CoordinateMapper {
    transform: Arc<dyn WorldTransform>,
}

impl CoordinateMapper {
    pub fn new(transform: Arc<dyn WorldTransform>) -> Self {
        Self { transform }
    }

    /// The underlying transform.
    #[must_use]
    pub fn transform(&self) -> &dyn WorldTransform {
        self.transform.as_ref()
    }

    /// Axis type names in the transform's native order.
    #[must_use]
    pub fn axis_names(&self) -> [String; 3] {
        self.transform.description().ctype
    }

    /// Converts a single array index to a world coordinate.
    ///
    /// The index's axis order is reversed before conversion and the singleton
    /// batch result is reduced to one coordinate.
    #[must_use]
    pub fn index_to_world(&self, index: IndexVector) -> [f64; 3] {
        let pix = [index[2] as f64, index[1] as f64, index[0] as f64];
        let mut batch = self.transform.pix_to_world(&[pix]);
        batch.remove(0)
    }

    /// Resolves a world-space window `center +/- half_width` into clamped index
    /// corners `(lower, upper)`.
    ///
    /// The two candidate corners are transformed independently and ordered by
    /// component-wise min/max rather than by corner identity, because coordinate
    /// axes may be flipped or non-monotonic relative to index axes.
    #[must_use]
    pub fn index_window(
        &self,
        center: [f64; 3],
        half_width: [f64; 3],
        shape: [usize; 3],
    ) -> (IndexVector, IndexVector) {
        let lo_corner = [
            center[0] - half_width[0],
            center[1] - half_width[1],
            center[2] - half_width[2],
        ];
        let hi_corner = [
            center[0] + half_width[0],
            center[1] + half_width[1],
            center[2] + half_width[2],
        ];
        let pix = self.transform.world_to_pix(&[lo_corner, hi_corner]);
        let mut lower = [0.0; 3];
        let mut upper = [0.0; 3];
        for axis in 0..3 {
            lower[axis] = pix[0][axis].min(pix[1][axis]).round();
            upper[axis] = pix[0][axis].max(pix[1][axis]).round();
        }
        // back to array axis order before clamping
        let lower = [lower[2], lower[1], lower[0]];
        let upper = [upper[2], upper[1], upper[0]];
        (fix_limits(lower, shape), fix_limits(upper, shape))
    }

    /// Computes the physical bounding box of the full index volume.
    ///
    /// The extreme cell centers are transformed and pushed outward by half a cell
    /// width in world space, so the ranges report cell-edge rather than
    /// cell-center bounds. The spectral axis is additionally converted to radio
    /// velocities against the transform's rest frequency.
    #[must_use]
    pub fn world_extent(&self, shape: [usize; 3]) -> WorldExtent {
        let desc = self.transform.description();
        let last = [
            shape[2].saturating_sub(1) as f64,
            shape[1].saturating_sub(1) as f64,
            shape[0].saturating_sub(1) as f64,
        ];
        let corners = self.transform.pix_to_world(&[[0.0; 3], last]);
        let mut lower = [0.0; 3];
        let mut upper = [0.0; 3];
        for axis in 0..3 {
            lower[axis] = corners[0][axis] - desc.cdelt[axis] / 2.0;
            upper[axis] = corners[1][axis] + desc.cdelt[axis] / 2.0;
        }
        let velocity_km_s = desc
            .rest_frequency
            .map(|f0| (radio_velocity(lower[2], f0), radio_velocity(upper[2], f0)));
        WorldExtent {
            ranges: [
                (lower[2], upper[2]),
                (lower[1], upper[1]),
                (lower[0], upper[0]),
            ],
            velocity_km_s,
        }
    }

    /// Enumerates every integer index in `slab` as a dense 3xN grid.
    ///
    /// Columns are ordered row-major (axis 2 varying fastest); rows are in array
    /// axis order.
    #[must_use]
    pub fn index_features(&self, slab: &Slab) -> Array2<f64> {
        let mut grid = Array2::<f64>::zeros((3, slab.len()));
        let mut col = 0;
        for i0 in slab.start[0]..slab.stop[0] {
            for i1 in slab.start[1]..slab.stop[1] {
                for i2 in slab.start[2]..slab.stop[2] {
                    grid[[0, col]] = i0 as f64;
                    grid[[1, col]] = i1 as f64;
                    grid[[2, col]] = i2 as f64;
                    col += 1;
                }
            }
        }
        grid
    }

    /// World coordinates of every integer index in `slab`, as a 3xN matrix with
    /// rows in the transform's native axis order.
    #[must_use]
    pub fn features(&self, slab: &Slab) -> Array2<f64> {
        let grid = self.index_features(slab);
        let pixels: Vec<[f64; 3]> = (0..grid.ncols())
            .map(|c| [grid[[2, c]], grid[[1, c]], grid[[0, c]]])
            .collect();
        let worlds = self.transform.pix_to_world(&pixels);
        let mut out = Array2::<f64>::zeros((3, worlds.len()));
        for (c, world) in worlds.iter().enumerate() {
            for axis in 0..3 {
                out[[axis, c]] = world[axis];
            }
        }
        out
    }
}

fn radio_velocity(freq_hz: f64, rest_hz: f64) -> f64 {
    SPEED_OF_LIGHT_KM_S * (rest_hz - freq_hz) / rest_hz
}

/// Builds a mapper directly from a linear transform.
impl From<LinearWcs> for CoordinateMapper {
    fn from(wcs: LinearWcs) -> Self {
        Self::new(Arc::new(wcs))
    }
}
