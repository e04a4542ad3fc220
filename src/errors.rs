//! Centralized error handling for astrocube
//!
//! This module provides structured error types to replace the generic `Box<dyn Error>`
//! pattern, enabling better error context and type safety. Out-of-bounds index
//! requests are deliberately not represented here: they are resolved by silent
//! clamping in the `slab` module.

use std::fmt;

/// Main error type for astrocube operations
#[derive(Debug)]
pub enum CubeError {
    /// A normalization factor of zero in standardize/unstandardize
    ZeroDivision { op: String },

    /// Patch/destination extent mismatch in flux combination or mask assignment
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// A reduction over a cube with no valid samples
    EmptyReduction { op: String },

    /// Statistics computation errors
    StatisticsError(String),

    /// Invalid argument to a resampling/rotation filter
    FilterError(String),

    /// A required header card is absent from a FITS file
    MissingCard { card: String },

    /// A FITS file that cannot be interpreted as a cube
    FitsFormat { message: String },

    /// Thread pool configuration error
    ThreadPoolError(String),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Generic error for backward compatibility
    Generic(String),
}

impl fmt::Display for CubeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CubeError::ZeroDivision { op } => {
                write!(f, "Normalization factor is zero in '{}'", op)
            }
            CubeError::ShapeMismatch { expected, found } => {
                write!(f, "Shape mismatch: expected {:?}, found {:?}", expected, found)
            }
            CubeError::EmptyReduction { op } => {
                write!(f, "Cannot compute '{}' over a fully masked cube", op)
            }
            CubeError::StatisticsError(msg) => {
                write!(f, "Statistics computation error: {}", msg)
            }
            CubeError::FilterError(msg) => write!(f, "Filter error: {}", msg),
            CubeError::MissingCard { card } => {
                write!(f, "Header card '{}' not found in file", card)
            }
            CubeError::FitsFormat { message } => write!(f, "FITS format error: {}", message),
            CubeError::ThreadPoolError(msg) => write!(f, "Thread pool error: {}", msg),
            CubeError::IoError(e) => write!(f, "I/O error: {}", e),
            CubeError::ArrayError(e) => write!(f, "Array error: {}", e),
            CubeError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CubeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CubeError::IoError(e) => Some(e),
            CubeError::ArrayError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CubeError {
    fn from(error: std::io::Error) -> Self {
        CubeError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for CubeError {
    fn from(error: ndarray::ShapeError) -> Self {
        CubeError::ArrayError(error)
    }
}

impl From<String> for CubeError {
    fn from(error: String) -> Self {
        CubeError::Generic(error)
    }
}

impl From<&str> for CubeError {
    fn from(error: &str) -> Self {
        CubeError::Generic(error.to_string())
    }
}

/// Result type alias for astrocube operations
pub type Result<T> = std::result::Result<T, CubeError>;
