//! Cube metadata and human-readable descriptions
//!
//! This module defines the metadata card map carried by every cube and provides
//! functions for summarizing cube contents and describing their structure.

use crate::cube::MaskedCube;
use crate::statistics::{reduce, StatOperation};
use serde_json::Value;
use std::collections::HashMap;

/// Header-style metadata cards: key to string/number/bool value. Insertion order
/// is not significant.
pub type Metadata = HashMap<String, Value>;

/// Structured summary of a cube's contents
#[derive(Debug, Clone)]
pub struct CubeSummary {
    pub shape: [usize; 3],
    pub total_elements: usize,
    pub valid_count: usize,
    pub unit: String,
    pub flux: f32,
    pub min: Option<f32>,
    pub max: Option<f32>,
    pub rms: Option<f32>,
}

impl CubeSummary {
    /// Print the summary in a compact block
    pub fn print(&self) {
        println!("\n Cube Summary");
        println!("================================");
        println!(
            "   Shape: {} x {} x {}",
            self.shape[0], self.shape[1], self.shape[2]
        );
        println!(
            "   Valid samples: {} of {}",
            self.valid_count, self.total_elements
        );
        if !self.unit.is_empty() {
            println!("   Unit: {}", self.unit);
        }
        println!("   Flux: {}", self.flux);
        match (self.min, self.max) {
            (Some(min), Some(max)) => {
                println!("   Min: {}", min);
                println!("   Max: {}", max);
            }
            _ => println!("   Min/Max: (no valid samples)"),
        }
        if let Some(rms) = self.rms {
            println!("   RMS: {:.4}", rms);
        }
    }
}

/// Computes quick statistics (flux/min/max/RMS) on a cube.
#[must_use]
pub fn summarize(cube: &MaskedCube) -> CubeSummary {
    let shape = cube.shape();
    CubeSummary {
        shape,
        total_elements: shape.iter().product(),
        valid_count: cube.count(),
        unit: cube.unit().to_string(),
        flux: cube.flux(),
        min: reduce(cube.data(), cube.mask(), StatOperation::Min).ok(),
        max: reduce(cube.data(), cube.mask(), StatOperation::Max).ok(),
        rms: reduce(cube.data(), cube.mask(), StatOperation::Rms).ok(),
    }
}

/// Describes a cube showing its axes, unit, metadata cards, and storage size.
pub fn describe_cube(cube: &MaskedCube) {
    let shape = cube.shape();
    let names = cube.axis_names();

    println!("\n===== Axes =====");
    // axis type names come in transform order, the reverse of array order
    for (axis, len) in shape.iter().enumerate() {
        println!("    axis{} ({}): {}", axis, names[2 - axis], len);
    }

    if !cube.unit().is_empty() {
        println!("\n===== Unit =====");
        println!("    {}", cube.unit());
    }

    println!("\n===== Metadata =====");
    if cube.meta().is_empty() {
        println!("    (no cards)");
    } else {
        let mut cards: Vec<_> = cube.meta().iter().collect();
        cards.sort_by(|a, b| a.0.cmp(b.0));
        for (key, value) in cards {
            println!("    {} = {}", key, value);
        }
    }

    let total_elements: usize = shape.iter().product();
    let total_bytes = total_elements * std::mem::size_of::<f32>();
    println!("\n===== Storage =====");
    println!("    Total elements: {}", total_elements);
    if total_bytes < 1024 * 1024 {
        println!("    Data size: {:.2} KB", total_bytes as f64 / 1024.0);
    } else if total_bytes < 1024 * 1024 * 1024 {
        println!(
            "    Data size: {:.2} MB",
            total_bytes as f64 / (1024.0 * 1024.0)
        );
    } else {
        println!(
            "    Data size: {:.2} GB",
            total_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
        );
    }
}
