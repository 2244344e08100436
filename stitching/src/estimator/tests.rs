use super::*;
use crate::testing::{Scene, noise_tile};
use glam::DVec2;

const SHAPE: (usize, usize) = (100, 100);

fn estimator() -> ShiftEstimator {
    ShiftEstimator::new(PhaseCorrelationConfig::default(), 0.6)
}

fn twenty_percent() -> AxisOverlap {
    AxisOverlap::from_fraction(100, 0.2)
}

#[test]
fn test_roi_for_horizontal_neighbour() {
    let (first, second) = estimate_roi(SHAPE, IVec2::new(80, 0)).unwrap();
    assert_eq!(
        first,
        Roi {
            left: 80,
            top: 0,
            right: 100,
            bottom: 100
        }
    );
    assert_eq!(
        second,
        Roi {
            left: 0,
            top: 0,
            right: 20,
            bottom: 100
        }
    );
}

#[test]
fn test_roi_for_negative_component() {
    let (first, second) = estimate_roi(SHAPE, IVec2::new(-10, 5)).unwrap();
    assert_eq!(
        first,
        Roi {
            left: 0,
            top: 5,
            right: 90,
            bottom: 100
        }
    );
    assert_eq!(
        second,
        Roi {
            left: 10,
            top: 0,
            right: 100,
            bottom: 95
        }
    );
    assert_eq!(first.area(), second.area());
}

#[test]
fn test_roi_without_overlap() {
    for shift in [
        IVec2::new(100, 0),
        IVec2::new(0, 100),
        IVec2::new(-100, 3),
        IVec2::new(5, -120),
    ] {
        assert_eq!(
            estimate_roi(SHAPE, shift),
            Err(StitchError::NoOverlap { shift }),
            "shift {shift}"
        );
    }
}

#[test]
fn test_measure_shift_on_exact_overlap_is_zero() {
    let scene = Scene::new(200, 120, 7);
    let left = scene.tile(0, 0, 100, 100);
    let right = scene.tile(80, 0, 100, 100);

    let correction = estimator()
        .measure_shift(&left, &right, IVec2::new(80, 0))
        .unwrap();
    assert_eq!(correction, IVec2::ZERO);
}

#[test]
fn test_measure_shift_reports_drift_from_expected() {
    let scene = Scene::new(220, 140, 11);
    let left = scene.tile(0, 0, 100, 100);
    // Actually 83 px to the right and 2 px lower than the first tile.
    let right = scene.tile(83, 2, 100, 100);

    let correction = estimator()
        .measure_shift(&left, &right, IVec2::new(80, 0))
        .unwrap();
    assert_eq!(correction, IVec2::new(-3, -2));
}

#[test]
fn test_measure_shift_vertical_neighbour() {
    let scene = Scene::new(140, 220, 13);
    let top = scene.tile(0, 0, 100, 100);
    let bottom = scene.tile(1, 78, 100, 100);

    let correction = estimator()
        .measure_shift(&top, &bottom, IVec2::new(0, 80))
        .unwrap();
    // Observed (1, 78) = expected (0, 80) - correction
    assert_eq!(correction, IVec2::new(-1, 2));
}

#[test]
fn test_measure_shift_without_overlap_is_an_error() {
    let scene = Scene::new(100, 100, 3);
    let tile = scene.tile(0, 0, 50, 50);
    assert!(matches!(
        estimator().measure_shift(&tile, &tile, IVec2::new(50, 0)),
        Err(StitchError::NoOverlap { .. })
    ));
}

#[test]
fn test_match_score_identical_overlap() {
    let scene = Scene::new(200, 100, 5);
    let left = scene.tile(0, 0, 100, 100);
    let right = scene.tile(80, 0, 100, 100);

    let score = estimator().match_score(&left, &right, IVec2::new(80, 0), &twenty_percent());
    assert!(score > 0.99, "score = {score}");
}

#[test]
fn test_match_score_rejects_implausible_shift_length() {
    let scene = Scene::new(200, 100, 5);
    let left = scene.tile(0, 0, 100, 100);
    let right = scene.tile(40, 0, 100, 100);

    // The content matches perfectly at (40, 0), but that length is far from
    // what a 20% overlap allows.
    let score = estimator().match_score(&left, &right, IVec2::new(40, 0), &twenty_percent());
    assert_eq!(score, 0.0);
}

#[test]
fn test_match_score_flat_region_is_zero() {
    let flat = Tile::new(
        Buffer2::new_filled(100, 100, 0.3),
        DVec2::ZERO,
        DVec2::splat(1e-6),
    );
    let scene = Scene::new(100, 100, 2);
    let textured = scene.tile(0, 0, 100, 100);

    let est = estimator();
    assert_eq!(
        est.match_score(&flat, &textured, IVec2::new(80, 0), &twenty_percent()),
        0.0
    );
    assert_eq!(
        est.match_score(&textured, &flat, IVec2::new(80, 0), &twenty_percent()),
        0.0
    );
}

#[test]
fn test_match_score_uncorrelated_noise_is_poor() {
    let a = noise_tile(100, 100, DVec2::ZERO, 21);
    let b = noise_tile(100, 100, DVec2::new(80.0, 0.0), 22);

    let score = estimator().match_score(&a, &b, IVec2::new(80, 0), &twenty_percent());
    assert!(score < 0.2, "score = {score}");
}

#[test]
fn test_normalized_covariance_is_clamped_at_zero() {
    let a = Buffer2::from_fn(4, 1, |x, _| x as f32);
    let b = Buffer2::from_fn(4, 1, |x, _| -(x as f32));
    let roi = Roi {
        left: 0,
        top: 0,
        right: 4,
        bottom: 1,
    };
    assert_eq!(normalized_covariance(&a, &roi, &b, &roi), 0.0);
    assert!((normalized_covariance(&a, &roi, &a, &roi) - 1.0).abs() < 1e-12);
}
