//! FITS I/O for cubes
//!
//! This module bridges cubes to FITS files: it builds a header/data unit from a
//! cube's samples and metadata cards, writes it as the primary HDU, and loads a
//! cube back, reconstructing a linear transform from the standard WCS cards.
//!
//! FITS axis order (`NAXIS1` fastest) is the reverse of the cube's array axis
//! order, and FITS reference pixels are 1-based where the crate's are 0-based;
//! both conversions happen here and nowhere else.

use crate::cube::MaskedCube;
use crate::errors::{CubeError, Result};
use crate::metadata::Metadata;
use crate::wcs::{CoordinateMapper, LinearWcs, WcsDescription};
use chrono::Utc;
use fitrs::{Fits, FitsData, Hdu, HeaderValue};
use log::warn;
use ndarray::Array3;
use std::fs;
use std::path::Path;

/// Builds a FITS HDU from the cube's data and metadata mapping.
///
/// Standard cards (WCS, `BUNIT`, `HISTORY`) are written first, then every
/// metadata card with a representable value type.
#[must_use]
pub fn cube_to_hdu(cube: &MaskedCube) -> Hdu {
    let [n0, n1, n2] = cube.shape();
    let raw: Vec<f32> = cube.data().iter().copied().collect();
    let mut hdu = Hdu::new(&[n2, n1, n0], raw);

    write_wcs_cards(&mut hdu, &cube.mapper().transform().description());
    hdu.insert("BUNIT", cube.unit());
    for (key, value) in cube.meta() {
        insert_card(&mut hdu, key, value);
    }
    let history = format!("Created by astrocube on {}", Utc::now().to_rfc3339());
    hdu.insert("HISTORY", history.as_str());
    hdu
}

/// Writes the cube as the primary HDU of a new FITS file, replacing any
/// existing file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_cube<P: AsRef<Path>>(cube: &MaskedCube, path: P) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        fs::remove_file(path)?;
    }
    Fits::create(path, cube_to_hdu(cube))?;
    Ok(())
}

/// Loads a cube from the primary HDU of a FITS file.
///
/// Integer samples are widened to f32 with blanked values mapped to NaN; the
/// coordinate mapper is rebuilt from the `CRVAL`/`CRPIX`/`CDELT`/`CTYPE` cards
/// (plus `RESTFRQ` when present) and the unit from `BUNIT`. Non-standard cards
/// are not enumerated back into the metadata map; fetch them per key with
/// [`card_value`].
///
/// # Errors
///
/// Returns `FitsFormat` for files that are not 3-axis sample arrays and
/// `MissingCard` when a required WCS card is absent.
pub fn read_cube<P: AsRef<Path>>(path: P) -> Result<MaskedCube> {
    let fits = Fits::open(path)?;
    let hdu = fits.get(0).ok_or_else(|| CubeError::FitsFormat {
        message: "file has no primary HDU".to_string(),
    })?;

    let (shape, samples) = match hdu.read_data() {
        FitsData::FloatingPoint32(arr) => (arr.shape.clone(), arr.data.clone()),
        FitsData::FloatingPoint64(arr) => (
            arr.shape.clone(),
            arr.data.iter().map(|&v| v as f32).collect(),
        ),
        FitsData::IntegersI32(arr) => (
            arr.shape.clone(),
            arr.data
                .iter()
                .map(|v| v.map_or(f32::NAN, |x| x as f32))
                .collect(),
        ),
        FitsData::IntegersU32(arr) => (
            arr.shape.clone(),
            arr.data
                .iter()
                .map(|v| v.map_or(f32::NAN, |x| x as f32))
                .collect(),
        ),
        FitsData::Characters(_) => {
            return Err(CubeError::FitsFormat {
                message: "character data cannot be read as a cube".to_string(),
            })
        }
    };

    if shape.len() != 3 {
        return Err(CubeError::FitsFormat {
            message: format!("expected 3 axes, found {}", shape.len()),
        });
    }
    // FITS axis order is the reverse of array axis order
    let data = Array3::from_shape_vec((shape[2], shape[1], shape[0]), samples)?;

    let wcs = wcs_from_header(&hdu)?;
    let unit = card_string(&hdu, "BUNIT").unwrap_or_default();
    Ok(MaskedCube::new(
        data,
        CoordinateMapper::from(wcs),
        Metadata::new(),
        unit,
    ))
}

/// Reads a single header card as a metadata value.
#[must_use]
pub fn card_value(hdu: &Hdu, key: &str) -> Option<serde_json::Value> {
    match hdu.value(key)? {
        HeaderValue::CharacterString(s) => Some(serde_json::Value::String(s.clone())),
        HeaderValue::Logical(b) => Some(serde_json::Value::Bool(*b)),
        HeaderValue::IntegerNumber(i) => Some(serde_json::Value::from(*i)),
        HeaderValue::RealFloatingNumber(v) => Some(serde_json::Value::from(*v)),
        _ => None,
    }
}

fn write_wcs_cards(hdu: &mut Hdu, desc: &WcsDescription) {
    for axis in 0..3 {
        let n = axis + 1;
        let ctype = format!("CTYPE{}", n);
        let crval = format!("CRVAL{}", n);
        let crpix = format!("CRPIX{}", n);
        let cdelt = format!("CDELT{}", n);
        hdu.insert(ctype.as_str(), desc.ctype[axis].as_str());
        hdu.insert(crval.as_str(), desc.crval[axis]);
        // FITS reference pixels are 1-based
        hdu.insert(crpix.as_str(), desc.crpix[axis] + 1.0);
        hdu.insert(cdelt.as_str(), desc.cdelt[axis]);
    }
    if let Some(restfrq) = desc.rest_frequency {
        hdu.insert("RESTFRQ", restfrq);
    }
}

fn insert_card(hdu: &mut Hdu, key: &str, value: &serde_json::Value) {
    match value {
        serde_json::Value::String(s) => {
            hdu.insert(key, s.as_str());
        }
        serde_json::Value::Bool(b) => {
            hdu.insert(key, HeaderValue::Logical(*b));
        }
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                match i32::try_from(i) {
                    Ok(i) => {
                        hdu.insert(key, i);
                    }
                    Err(_) => {
                        hdu.insert(key, i as f64);
                    }
                }
            } else if let Some(f) = n.as_f64() {
                hdu.insert(key, f);
            }
        }
        _ => warn!("skipped unsupported metadata card '{}'", key),
    }
}

fn wcs_from_header(hdu: &Hdu) -> Result<LinearWcs> {
    let mut crval = [0.0; 3];
    let mut crpix = [0.0; 3];
    let mut cdelt = [1.0; 3];
    let mut ctype = [String::new(), String::new(), String::new()];
    for axis in 0..3 {
        let n = axis + 1;
        crval[axis] = required_f64(hdu, &format!("CRVAL{}", n))?;
        crpix[axis] = required_f64(hdu, &format!("CRPIX{}", n))? - 1.0;
        cdelt[axis] = required_f64(hdu, &format!("CDELT{}", n))?;
        ctype[axis] = card_string(hdu, &format!("CTYPE{}", n)).unwrap_or_default();
    }
    let wcs = LinearWcs::new(crval, crpix, cdelt).with_axis_names(ctype);
    Ok(match card_f64(hdu, "RESTFRQ") {
        Some(restfrq) => wcs.with_rest_frequency(restfrq),
        None => wcs,
    })
}

fn required_f64(hdu: &Hdu, key: &str) -> Result<f64> {
    card_f64(hdu, key).ok_or_else(|| CubeError::MissingCard {
        card: key.to_string(),
    })
}

fn card_f64(hdu: &Hdu, key: &str) -> Option<f64> {
    match hdu.value(key)? {
        HeaderValue::RealFloatingNumber(v) => Some(*v),
        HeaderValue::IntegerNumber(i) => Some(f64::from(*i)),
        _ => None,
    }
}

fn card_string(hdu: &Hdu, key: &str) -> Option<String> {
    match hdu.value(key)? {
        HeaderValue::CharacterString(s) => Some(s.clone()),
        _ => None,
    }
}
