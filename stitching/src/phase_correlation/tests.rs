//! Tests for phase correlation module.

use super::*;

/// High-contrast checkerboard, circularly shifted by `(offset_x, offset_y)`.
fn create_test_image(width: usize, height: usize, offset_x: isize, offset_y: isize) -> Buffer2<f32> {
    Buffer2::from_fn(width, height, |x, y| {
        let xx = (x as isize - offset_x).rem_euclid(width as isize) as usize;
        let yy = (y as isize - offset_y).rem_euclid(height as isize) as usize;
        let checker = ((xx / 7) + (yy / 5) + (xx * yy / 31)) % 2;
        if checker == 0 { 0.0 } else { 1.0 }
    })
}

fn unwindowed() -> PhaseCorrelationConfig {
    PhaseCorrelationConfig {
        use_windowing: false,
        min_peak_value: 0.001,
    }
}

#[test]
fn test_correlate_identical_images() {
    let reference = create_test_image(64, 64, 0, 0);

    let mut correlator = PhaseCorrelator::new(PhaseCorrelationConfig::default());
    let result = correlator
        .correlate(&reference, &reference)
        .expect("Correlation of identical images should succeed");

    assert_eq!(result.translation, IVec2::ZERO);
    assert!(result.peak_value > 0.5, "peak = {}", result.peak_value);
}

#[test]
fn test_correlate_circular_shift_is_exact() {
    let reference = create_test_image(64, 32, 0, 0);
    let target = create_test_image(64, 32, 5, -3);

    let mut correlator = PhaseCorrelator::new(unwindowed());
    let result = correlator
        .correlate(&reference, &target)
        .expect("Correlation should succeed");

    assert_eq!(result.translation, IVec2::new(5, -3));
}

#[test]
fn test_correlate_non_square_region() {
    // Overlap strips are typically narrow and tall.
    let reference = create_test_image(20, 100, 0, 0);
    let target = create_test_image(20, 100, 0, 0);

    let mut correlator = PhaseCorrelator::new(PhaseCorrelationConfig::default());
    let result = correlator
        .correlate(&reference, &target)
        .expect("Correlation should succeed");

    assert_eq!(result.translation, IVec2::ZERO);
}

#[test]
fn test_correlate_reversed_order_negates_translation() {
    let reference = create_test_image(32, 32, 0, 0);
    let target = create_test_image(32, 32, -4, 2);

    let mut correlator = PhaseCorrelator::new(unwindowed());
    let forward = correlator.correlate(&reference, &target).unwrap();
    let backward = correlator.correlate(&target, &reference).unwrap();

    assert_eq!(forward.translation, IVec2::new(-4, 2));
    assert_eq!(backward.translation, -forward.translation);
}

#[test]
fn test_correlate_rejects_mismatched_sizes() {
    let small = Buffer2::new_filled(16, 16, 1.0f32);
    let large = Buffer2::new_filled(32, 16, 1.0f32);

    let mut correlator = PhaseCorrelator::new(PhaseCorrelationConfig::default());
    assert!(correlator.correlate(&small, &large).is_none());
}

#[test]
fn test_correlate_rejects_empty_input() {
    let empty = Buffer2::new(0, 0, Vec::<f32>::new());

    let mut correlator = PhaseCorrelator::new(PhaseCorrelationConfig::default());
    assert!(correlator.correlate(&empty, &empty).is_none());
}

#[test]
fn test_flat_images_fall_below_peak_threshold() {
    let flat = Buffer2::new_filled(16, 16, 0.0f32);

    let mut correlator = PhaseCorrelator::new(PhaseCorrelationConfig::default());
    assert!(correlator.correlate(&flat, &flat).is_none());
}

#[test]
fn test_hann_window() {
    let window = hann_window(64);
    assert_eq!(window.len(), 64);

    // Window should be 0 at edges and 1 at center
    assert!(window[0] < 0.01);
    assert!(window[63] < 0.01);
    assert!((window[32] - 1.0).abs() < 0.01);
}

#[test]
fn test_hann_window_degenerate_sizes_are_flat() {
    assert_eq!(hann_window(1), vec![1.0]);
    assert_eq!(hann_window(2), vec![1.0, 1.0]);
}

#[test]
fn test_transpose_rectangular() {
    let data: Vec<Complex<f32>> = (0..6).map(|i| Complex::new(i as f32, 0.0)).collect();

    // 3 wide, 2 high -> 2 wide, 3 high
    let transposed = transpose(&data, 3, 2);
    let values: Vec<f32> = transposed.iter().map(|c| c.re).collect();
    assert_eq!(values, vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
}

#[test]
#[should_panic(expected = "min_peak_value must be within [0, 1]")]
fn test_config_rejects_out_of_range_threshold() {
    PhaseCorrelationConfig {
        min_peak_value: 1.5,
        ..Default::default()
    }
    .validate();
}
