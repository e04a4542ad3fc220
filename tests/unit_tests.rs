//! Comprehensive unit tests for astrocube modules
//!
//! These tests provide extensive coverage of the core functionality
//! to ensure reliability and prevent regressions.

use astrocube::{
    cube::MaskedCube,
    errors::CubeError,
    filters::{denoise, zoom, Interpolation, ScaleFactor},
    metadata::{summarize, Metadata},
    parallel::{get_parallel_info, ParallelConfig},
    slab::{fix_limits, matching_slabs, resolve_slab, Slab},
    standardize::{standardize, unstandardize},
    statistics::StatOperation,
    wcs::{CoordinateMapper, LinearWcs},
};
use ndarray::Array3;

fn test_mapper() -> CoordinateMapper {
    // native order (ra, dec, freq); spectral axis is array axis 0
    LinearWcs::new([45.0, -30.0, 1.42e9], [0.0, 0.0, 0.0], [1e-4, 1e-4, 1e6]).into()
}

fn cube_from_vec(shape: (usize, usize, usize), values: Vec<f32>) -> MaskedCube {
    let data = Array3::from_shape_vec(shape, values).expect("bad test shape");
    MaskedCube::new(data, test_mapper(), Metadata::new(), "Jy/beam")
}

#[test]
fn test_error_types() {
    let zero_err = CubeError::ZeroDivision {
        op: "standardize".to_string(),
    };
    assert!(format!("{}", zero_err).contains("Normalization factor is zero"));

    let shape_err = CubeError::ShapeMismatch {
        expected: vec![3, 3, 3],
        found: vec![2, 2, 2],
    };
    assert!(format!("{}", shape_err).contains("Shape mismatch"));

    let empty_err = CubeError::EmptyReduction {
        op: "maximum".to_string(),
    };
    assert!(format!("{}", empty_err).contains("fully masked"));

    let card_err = CubeError::MissingCard {
        card: "CRVAL1".to_string(),
    };
    assert!(format!("{}", card_err).contains("CRVAL1"));

    let generic_err = CubeError::Generic("Test error".to_string());
    assert_eq!(format!("{}", generic_err), "Test error");
}

#[test]
fn test_fix_limits_clamps_and_truncates() {
    let shape = [4, 5, 6];

    // fractional components truncate toward zero
    assert_eq!(fix_limits([1.7, -0.9, 2.2], shape), [1, 0, 2]);

    // out-of-range components clamp to the boundary
    assert_eq!(fix_limits([-3.0, 9.0, 6.0], shape), [0, 5, 6]);

    // every component always lands in [0, shape[axis]]
    for &vector in &[[-10.0, 2.5, 100.0], [0.0, 0.0, 0.0], [4.0, 5.0, 6.0]] {
        let fixed = fix_limits(vector, shape);
        for axis in 0..3 {
            assert!(fixed[axis] <= shape[axis]);
        }
    }
}

#[test]
fn test_resolve_slab_defaults_to_full_volume() {
    let slab = resolve_slab(None, None, [3, 4, 5]);
    assert_eq!(slab.start, [0, 0, 0]);
    assert_eq!(slab.stop, [3, 4, 5]);
    assert_eq!(slab.shape(), [3, 4, 5]);
    assert_eq!(slab.len(), 60);
}

#[test]
fn test_resolve_slab_inverted_request_is_empty() {
    let slab = resolve_slab(Some([4.0, 4.0, 4.0]), Some([2.0, 2.0, 2.0]), [6, 6, 6]);
    assert!(slab.is_empty());
    assert_eq!(slab.start, slab.stop);
}

#[test]
fn test_matching_slabs_right_aligned_truncation() {
    // A 5x5x5 patch requested at (-2,-2,-2)..(3,3,3) in a 10x10x10 destination
    // must use exactly the last 3 patch elements on every clamped axis.
    let (dest, patch) = matching_slabs(
        [10, 10, 10],
        [5, 5, 5],
        Some([-2.0, -2.0, -2.0]),
        Some([3.0, 3.0, 3.0]),
    )
    .expect("alignment should succeed");

    assert_eq!(dest.start, [0, 0, 0]);
    assert_eq!(dest.stop, [3, 3, 3]);
    assert_eq!(patch.start, [2, 2, 2]);
    assert_eq!(patch.stop, [5, 5, 5]);
}

#[test]
fn test_matching_slabs_left_aligned_on_upper_clamp() {
    let (dest, patch) = matching_slabs(
        [10, 10, 10],
        [5, 5, 5],
        Some([8.0, 8.0, 8.0]),
        Some([13.0, 13.0, 13.0]),
    )
    .expect("alignment should succeed");

    assert_eq!(dest.start, [8, 8, 8]);
    assert_eq!(dest.stop, [10, 10, 10]);
    assert_eq!(patch.start, [0, 0, 0]);
    assert_eq!(patch.stop, [2, 2, 2]);
}

#[test]
fn test_matching_slabs_both_sides_clamped() {
    // Window swallows the whole destination; right-alignment takes precedence.
    let (dest, patch) = matching_slabs(
        [4, 4, 4],
        [10, 10, 10],
        Some([-3.0, -3.0, -3.0]),
        Some([8.0, 8.0, 8.0]),
    )
    .expect("alignment should succeed");

    assert_eq!(dest, Slab { start: [0, 0, 0], stop: [4, 4, 4] });
    assert_eq!(patch, Slab { start: [6, 6, 6], stop: [10, 10, 10] });
}

#[test]
fn test_matching_slabs_rejects_undersized_patch() {
    // Interior window larger than the patch on every axis
    let result = matching_slabs(
        [10, 10, 10],
        [2, 2, 2],
        Some([1.0, 1.0, 1.0]),
        Some([6.0, 6.0, 6.0]),
    );
    assert!(matches!(result, Err(CubeError::ShapeMismatch { .. })));

    // Left-clamped window extending past the patch extent
    let result = matching_slabs(
        [10, 10, 10],
        [2, 2, 2],
        Some([-1.0, -1.0, -1.0]),
        Some([3.0, 3.0, 3.0]),
    );
    assert!(matches!(result, Err(CubeError::ShapeMismatch { .. })));
}

#[test]
fn test_standardize_round_trip() {
    let mut data =
        Array3::from_shape_vec((2, 2, 2), (1..=8).map(|v| v as f32).collect()).unwrap();
    let original = data.clone();

    let params = standardize(&mut data).expect("standardize should succeed");
    assert!((params.y_min - 1.0).abs() < 1e-6);
    // factor is the sum of the shifted data: 0 + 1 + ... + 7
    assert!((params.y_factor - 28.0).abs() < 1e-6);
    assert!((data.sum() - 1.0).abs() < 1e-5);

    unstandardize(&mut data, &params).expect("unstandardize should succeed");
    for (a, b) in data.iter().zip(original.iter()) {
        assert!((a - b).abs() < 1e-5);
    }
}

#[test]
fn test_standardize_zero_factor_is_an_error() {
    // Constant data shifts to all zeros, so the normalization factor is zero
    let mut data = Array3::from_elem((2, 2, 2), 5.0_f32);
    match standardize(&mut data) {
        Err(CubeError::ZeroDivision { op }) => assert_eq!(op, "standardize"),
        other => panic!("Expected ZeroDivision error, got {:?}", other),
    }
}

#[test]
fn test_cube_standardize_matches_raw_helper() {
    let mut cube = cube_from_vec((2, 2, 2), (1..=8).map(|v| v as f32).collect());
    let params = cube.standardize().expect("standardize should succeed");
    assert!((params.y_min - 1.0).abs() < 1e-6);
    assert!((params.y_factor - 28.0).abs() < 1e-6);

    cube.unstandardize(&params).expect("unstandardize should succeed");
    assert!((cube.data()[[1, 1, 1]] - 8.0).abs() < 1e-5);
}

#[test]
fn test_flux_excludes_masked_samples() {
    let values = vec![1.0, 2.0, 3.0, f32::NAN, 5.0, 6.0, 7.0, 8.0];
    let cube = cube_from_vec((2, 2, 2), values);

    assert_eq!(cube.count(), 7);
    assert!((cube.flux() - 32.0).abs() < 1e-5);
}

#[test]
fn test_estimate_rms_over_valid_samples() {
    let values = vec![
        3.0,
        4.0,
        f32::NAN,
        f32::NAN,
        f32::NAN,
        f32::NAN,
        f32::NAN,
        f32::NAN,
    ];
    let cube = cube_from_vec((2, 2, 2), values);
    let rms = cube.estimate_rms().expect("two valid samples remain");
    assert!((rms - 12.5_f32.sqrt()).abs() < 1e-5);
}

#[test]
fn test_variance_known_value() {
    let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    let cube = cube_from_vec((2, 2, 2), values);
    let std_dev = cube.variance().expect("cube has valid samples");
    assert!((std_dev - 2.0).abs() < 1e-5);
}

#[test]
fn test_max_min_tie_break_and_empty_reduction() {
    let mut values = vec![0.0; 8];
    values[2] = 9.0;
    values[5] = 9.0;
    let cube = cube_from_vec((2, 2, 2), values);

    // first occurrence in row-major order wins the tie
    let (max_val, max_idx) = cube.max().expect("cube has valid samples");
    assert_eq!(max_val, 9.0);
    assert_eq!(max_idx, [0, 1, 0]);

    let (min_val, min_idx) = cube.min().expect("cube has valid samples");
    assert_eq!(min_val, 0.0);
    assert_eq!(min_idx, [0, 0, 0]);

    // an all-masked cube has no extrema to report
    let masked = cube_from_vec((2, 2, 2), vec![f32::NAN; 8]);
    match masked.max() {
        Err(CubeError::EmptyReduction { op }) => assert_eq!(op, "maximum"),
        other => panic!("Expected EmptyReduction error, got {:?}", other),
    }
    assert!(masked.min().is_err());
    assert!(masked.variance().is_err());
    assert!(masked.estimate_rms().is_err());
}

#[test]
fn test_cut_and_stack() {
    let cube = cube_from_vec((2, 2, 2), (1..=8).map(|v| v as f32).collect());

    let region = cube.cut(Some([0.0, 0.0, 0.0]), Some([1.0, 2.0, 2.0]));
    assert_eq!(region.dim(), (1, 2, 2));
    assert_eq!(region[[0, 1, 1]], 4.0);

    // out-of-range windows clamp instead of failing
    let clamped = cube.cut(Some([-5.0, -5.0, -5.0]), Some([50.0, 50.0, 50.0]));
    assert_eq!(clamped.dim(), (2, 2, 2));

    let stacked = cube.stack(None, None, 0).expect("axis 0 is valid");
    assert_eq!(stacked.shape(), &[2, 2]);
    assert_eq!(stacked[[0, 0]], 6.0);
    assert_eq!(stacked[[1, 1]], 12.0);

    assert!(cube.stack(None, None, 3).is_err());
}

#[test]
fn test_stack_skips_masked_samples() {
    let values = vec![1.0, 2.0, 3.0, 4.0, f32::NAN, 6.0, 7.0, 8.0];
    let cube = cube_from_vec((2, 2, 2), values);
    let stacked = cube.stack(None, None, 0).expect("axis 0 is valid");
    // the NaN at [1,0,0] contributes nothing
    assert_eq!(stacked[[0, 0]], 1.0);
    assert_eq!(stacked[[0, 1]], 8.0);
}

#[test]
fn test_index_features_ordering() {
    let cube = cube_from_vec((4, 4, 4), vec![0.0; 64]);
    let grid = cube.index_features(Some([0.0, 0.0, 0.0]), Some([2.0, 2.0, 2.0]));

    assert_eq!(grid.dim(), (3, 8));
    // axis 2 varies fastest: first two columns are (0,0,0) and (0,0,1)
    assert_eq!(grid.column(0).to_vec(), vec![0.0, 0.0, 0.0]);
    assert_eq!(grid.column(1).to_vec(), vec![0.0, 0.0, 1.0]);
    assert_eq!(grid.column(7).to_vec(), vec![1.0, 1.0, 1.0]);
}

#[test]
fn test_features_match_index_to_world() {
    let cube = cube_from_vec((2, 2, 2), vec![1.0; 8]);
    let features = cube.features(Some([0.0, 0.0, 0.0]), Some([2.0, 2.0, 2.0]));
    assert_eq!(features.dim(), (3, 8));

    // column 1 is index (0,0,1); rows are in transform axis order
    let world = cube.index_to_world([0, 0, 1]);
    for axis in 0..3 {
        assert!((features[[axis, 1]] - world[axis]).abs() < 1e-9);
    }
}

#[test]
fn test_index_to_world_linear() {
    let cube = cube_from_vec((4, 4, 4), vec![0.0; 64]);
    // index (2,3,1) reverses to native pixel (1,3,2)
    let world = cube.index_to_world([2, 3, 1]);
    assert!((world[0] - (45.0 + 1.0 * 1e-4)).abs() < 1e-9);
    assert!((world[1] - (-30.0 + 3.0 * 1e-4)).abs() < 1e-9);
    assert!((world[2] - (1.42e9 + 2.0 * 1e6)).abs() < 1e-3);
}

#[test]
fn test_index_window_handles_flipped_axes() {
    // negative cdelt on the first native axis flips its orientation
    let mapper: CoordinateMapper =
        LinearWcs::new([45.0, -30.0, 1.42e9], [0.0, 0.0, 0.0], [-1e-4, 1e-4, 1e6]).into();
    let data = Array3::<f32>::zeros((8, 8, 8));
    let cube = MaskedCube::new(data, mapper, Metadata::new(), "Jy/beam");

    let center = cube.index_to_world([4, 4, 4]);
    let (lower, upper) = cube.index_from_window(center, [2e-4, 2e-4, 2e6]);
    for axis in 0..3 {
        assert!(lower[axis] <= upper[axis]);
        assert!(upper[axis] <= 8);
    }
    assert_eq!(lower, [2, 2, 2]);
    assert_eq!(upper, [6, 6, 6]);
}

#[test]
fn test_world_extent_reports_velocity() {
    let mapper: CoordinateMapper =
        LinearWcs::new([45.0, -30.0, 1.42e9], [0.0, 0.0, 0.0], [1e-4, 1e-4, 1e6])
            .with_rest_frequency(1.420405751e9)
            .into();
    let data = Array3::<f32>::zeros((4, 4, 4));
    let cube = MaskedCube::new(data, mapper, Metadata::new(), "Jy/beam");

    let extent = cube.world_extent();
    // spectral range: cell edges half a channel beyond the extreme centers
    let (f_lo, f_hi) = extent.ranges[0];
    assert!((f_lo - (1.42e9 - 0.5e6)).abs() < 1e-3);
    assert!((f_hi - (1.42e9 + 3.5e6)).abs() < 1e-3);

    let (v_lo, v_hi) = extent.velocity_km_s.expect("rest frequency is set");
    let c = 2.99792458e5;
    let f0 = 1.420405751e9;
    assert!((v_lo - c * (f0 - f_lo) / f0).abs() < 1e-6);
    assert!((v_hi - c * (f0 - f_hi) / f0).abs() < 1e-6);
    // higher frequency means lower radio velocity
    assert!(v_hi < v_lo);
}

#[test]
fn test_with_mask_shape_mismatch() {
    let data = Array3::<f32>::zeros((2, 2, 2));
    let mask = Array3::from_elem((2, 2, 3), false);
    let result = MaskedCube::with_mask(data, mask, test_mapper(), Metadata::new(), "");
    assert!(matches!(result, Err(CubeError::ShapeMismatch { .. })));
}

#[test]
fn test_with_mask_unions_nan_pattern() {
    let mut data = Array3::<f32>::zeros((2, 2, 2));
    data[[0, 0, 0]] = f32::NAN;
    let mut mask = Array3::from_elem((2, 2, 2), false);
    mask[[1, 1, 1]] = true;

    let cube = MaskedCube::with_mask(data, mask, test_mapper(), Metadata::new(), "")
        .expect("shapes agree");
    assert_eq!(cube.count(), 6);
    assert!(cube.mask()[[0, 0, 0]]);
    assert!(cube.mask()[[1, 1, 1]]);
}

#[test]
fn test_add_flux_patch_alignment() {
    let mut cube = cube_from_vec((10, 10, 10), vec![0.0; 1000]);
    let patch = Array3::from_elem((5, 5, 5), 1.0_f32);

    cube.add_flux(&patch, Some([-2.0, -2.0, -2.0]), Some([3.0, 3.0, 3.0]))
        .expect("alignment should succeed");

    // exactly the 3x3x3 visible window received flux
    assert!((cube.flux() - 27.0).abs() < 1e-5);
    assert_eq!(cube.data()[[0, 0, 0]], 1.0);
    assert_eq!(cube.data()[[2, 2, 2]], 1.0);
    assert_eq!(cube.data()[[3, 3, 3]], 0.0);
}

#[test]
fn test_add_flux_respects_existing_mask() {
    let mut values = vec![0.0_f32; 27];
    values[0] = f32::NAN;
    let mut cube = cube_from_vec((3, 3, 3), values);
    let patch = Array3::from_elem((3, 3, 3), 2.0_f32);

    cube.add_flux(&patch, None, None).expect("full-volume add");
    // the invalid sample stays invalid and contributes nothing
    assert!(cube.mask()[[0, 0, 0]]);
    assert!((cube.flux() - 52.0).abs() < 1e-5);
}

#[test]
fn test_replace_flux_rewrites_mask() {
    let mut values = vec![1.0_f32; 27];
    values[13] = f32::NAN;
    let mut cube = cube_from_vec((3, 3, 3), values);
    assert_eq!(cube.count(), 26);

    let mut patch = Array3::from_elem((3, 3, 3), 4.0_f32);
    patch[[0, 0, 1]] = f32::NAN;
    cube.replace_flux(&patch, None, None).expect("full-volume replace");

    // replacement revalidates the old NaN cell and invalidates the new one
    assert!(!cube.mask()[[1, 1, 1]]);
    assert!(cube.mask()[[0, 0, 1]]);
    assert_eq!(cube.count(), 26);
    assert_eq!(cube.data()[[1, 1, 1]], 4.0);
}

#[test]
fn test_copy_is_isolated() {
    let cube = cube_from_vec((2, 2, 2), (1..=8).map(|v| v as f32).collect());
    let mut copied = cube.copy();

    copied.set_data(Array3::from_elem((2, 2, 2), 0.0_f32));
    assert_eq!(cube.data()[[0, 0, 0]], 1.0);
    assert_eq!(copied.data()[[0, 0, 0]], 0.0);

    // deep copy keeps statistics independent
    assert!((cube.flux() - 36.0).abs() < 1e-5);
    assert!(copied.flux().abs() < 1e-5);
}

#[test]
fn test_empty_like_shares_mapper_and_meta() {
    let mut meta = Metadata::new();
    meta.insert("OBJECT".to_string(), serde_json::Value::from("ORION"));
    let data = Array3::from_elem((2, 3, 4), 7.0_f32);
    let cube = MaskedCube::new(data, test_mapper(), meta, "K");

    let empty = cube.empty_like();
    assert_eq!(empty.shape(), [2, 3, 4]);
    assert_eq!(empty.count(), 24);
    assert!(empty.flux().abs() < 1e-6);
    assert_eq!(empty.unit(), "K");
    assert_eq!(empty.meta()["OBJECT"], serde_json::Value::from("ORION"));
}

#[test]
fn test_set_data_rederives_mask() {
    let mut cube = cube_from_vec((2, 2, 2), vec![1.0; 8]);
    assert_eq!(cube.count(), 8);

    let mut replacement = Array3::from_elem((2, 2, 2), 2.0_f32);
    replacement[[0, 1, 0]] = f32::NAN;
    cube.set_data(replacement);
    assert_eq!(cube.count(), 7);
    assert!(cube.mask()[[0, 1, 0]]);
}

#[test]
fn test_zoom_factor_variants() {
    let cube = cube_from_vec((2, 2, 2), (1..=8).map(|v| v as f32).collect());

    // a uniform factor of one is an unchanged copy
    let same = cube
        .scale(ScaleFactor::Uniform(1.0), Interpolation::Linear)
        .expect("identity zoom");
    assert_eq!(same, *cube.data());

    let doubled = cube
        .scale(ScaleFactor::Uniform(2.0), Interpolation::Nearest)
        .expect("uniform zoom");
    assert_eq!(doubled.dim(), (4, 4, 4));
    assert_eq!(doubled[[0, 0, 0]], 1.0);
    assert_eq!(doubled[[3, 3, 3]], 8.0);

    let stretched = cube
        .scale(ScaleFactor::PerAxis([1.0, 2.0, 0.5]), Interpolation::Linear)
        .expect("per-axis zoom");
    assert_eq!(stretched.dim(), (2, 4, 1));

    let result = cube.scale(ScaleFactor::Uniform(-1.0), Interpolation::Linear);
    assert!(matches!(result, Err(CubeError::FilterError(_))));
}

#[test]
fn test_zoom_linear_interpolates() {
    let data = Array3::from_shape_vec((1, 1, 2), vec![0.0_f32, 10.0]).unwrap();
    let zoomed = zoom(&data, ScaleFactor::PerAxis([1.0, 1.0, 2.0]), Interpolation::Linear)
        .expect("zoom should succeed");
    assert_eq!(zoomed.dim(), (1, 1, 4));
    // samples remain within the original value range and increase monotonically
    for w in zoomed.as_slice().unwrap().windows(2) {
        assert!(w[0] <= w[1]);
    }
    assert!(zoomed[[0, 0, 0]] >= 0.0 && zoomed[[0, 0, 3]] <= 10.0);
}

#[test]
fn test_rotate_quarter_turn() {
    let mut data = Array3::<f32>::zeros((1, 3, 3));
    data[[0, 0, 1]] = 1.0;
    let cube = MaskedCube::new(data, test_mapper(), Metadata::new(), "");

    let rotated = cube.rotate(90.0, Interpolation::Nearest);
    assert_eq!(rotated.dim(), (1, 3, 3));
    assert_eq!(rotated[[0, 1, 2]], 1.0);
    assert_eq!(rotated[[0, 0, 1]], 0.0);

    // zero angle is an unchanged copy
    let same = cube.rotate(0.0, Interpolation::Nearest);
    assert_eq!(same, *cube.data());
}

#[test]
fn test_denoise_zeroes_below_threshold() {
    let data = Array3::from_shape_vec((1, 2, 2), vec![0.5, 2.0, f32::NAN, -1.0]).unwrap();
    let cleaned = denoise(&data, 1.0);
    assert_eq!(cleaned[[0, 0, 0]], 0.0);
    assert_eq!(cleaned[[0, 0, 1]], 2.0);
    assert!(cleaned[[0, 1, 0]].is_nan());
    assert_eq!(cleaned[[0, 1, 1]], 0.0);
}

#[test]
fn test_stat_operation() {
    assert_eq!(StatOperation::Flux.as_str(), "flux");
    assert_eq!(StatOperation::Rms.as_str(), "rms");
    assert_eq!(StatOperation::Variance.as_str(), "variance");
    assert_eq!(StatOperation::Min.as_str(), "minimum");
    assert_eq!(StatOperation::Max.as_str(), "maximum");
    assert_ne!(StatOperation::Min, StatOperation::Max);
}

#[test]
fn test_summarize_counts_and_extrema() {
    let values = vec![1.0, 2.0, 3.0, f32::NAN, 5.0, 6.0, 7.0, 8.0];
    let cube = cube_from_vec((2, 2, 2), values);
    let summary = summarize(&cube);

    assert_eq!(summary.shape, [2, 2, 2]);
    assert_eq!(summary.total_elements, 8);
    assert_eq!(summary.valid_count, 7);
    assert_eq!(summary.min, Some(1.0));
    assert_eq!(summary.max, Some(8.0));
    assert!((summary.flux - 32.0).abs() < 1e-5);
    assert_eq!(summary.unit, "Jy/beam");

    // printing must not panic
    summary.print();
}

#[test]
fn test_parallel_config() {
    let default_config = ParallelConfig::new_default();
    assert!(default_config.num_threads.is_none());

    let config_4 = ParallelConfig::with_threads(4);
    assert_eq!(config_4.num_threads, Some(4));

    let all_cores_config = ParallelConfig::all_cores();
    assert!(all_cores_config.num_threads.is_some());
    assert!(all_cores_config.num_threads.unwrap() > 0);

    let current = default_config.current_threads();
    assert!(current > 0);
}

#[test]
fn test_parallel_info() {
    let info = get_parallel_info();
    assert!(info.current_threads > 0);
    assert!(info.available_cores > 0);
    assert!(info.available_parallelism > 0);

    // printing must not panic
    info.print_info();
}
