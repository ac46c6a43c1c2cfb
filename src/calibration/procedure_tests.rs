use super::*;

const TOLERANCE: f64 = 1e-6;

/// Helper: estimator with the reference config calibrated at a constant width
fn calibrated_at(pixel_width: f64) -> DistanceEstimator {
    let mut estimator = DistanceEstimator::new_default();
    for _ in 0..estimator.config().target_frames {
        estimator.calibrate(pixel_width);
    }
    estimator
}

fn small_config(target_frames: u32) -> CalibrationConfig {
    CalibrationConfig {
        target_frames,
        ..CalibrationConfig::default()
    }
}

#[test]
fn test_new_default() {
    let estimator = DistanceEstimator::new_default();
    assert!(!estimator.is_calibrated());
    assert!(estimator.focal_length().is_none());
    assert_eq!(estimator.sample_count(), 0);
    assert_eq!(estimator.state(), CalibrationState::Uncalibrated);
}

#[test]
fn test_calibrate_returns_false_until_target() {
    let mut estimator = DistanceEstimator::new_default();
    for i in 1..30 {
        assert!(!estimator.calibrate(105.0), "call {} should not complete", i);
        assert_eq!(estimator.sample_count(), i);
        assert!(!estimator.is_calibrated());
    }
    assert!(estimator.calibrate(105.0), "30th call completes calibration");
    assert!(estimator.is_calibrated());
    assert_eq!(estimator.sample_count(), 30);
}

#[test]
fn test_constant_width_converges_to_steady_state() {
    let estimator = calibrated_at(105.0);
    let focal = estimator.focal_length().unwrap();
    // 105 * 60 / 6.3 = 1000
    assert!((focal - 1000.0).abs() < TOLERANCE, "focal {}", focal);
}

#[test]
fn test_first_sample_sets_focal_without_smoothing() {
    let mut estimator = DistanceEstimator::new_default();
    estimator.calibrate(63.0);
    assert!((estimator.focal_length().unwrap() - 600.0).abs() < TOLERANCE);
}

#[test]
fn test_exponential_smoothing_weights_history() {
    let mut estimator = DistanceEstimator::new_default();
    estimator.calibrate(105.0); // candidate 1000
    estimator.calibrate(210.0); // candidate 2000
    let focal = estimator.focal_length().unwrap();
    assert!((focal - (0.9 * 1000.0 + 0.1 * 2000.0)).abs() < TOLERANCE);
}

#[test]
fn test_idempotent_after_calibration() {
    let mut estimator = calibrated_at(105.0);
    let focal_before = estimator.focal_length();
    let count_before = estimator.sample_count();

    for width in [1.0, 500.0, 0.0] {
        assert!(estimator.calibrate(width));
    }

    assert_eq!(estimator.focal_length(), focal_before);
    assert_eq!(estimator.sample_count(), count_before);
}

#[test]
fn test_round_trip_at_calibration_point() {
    for width in [40.0, 105.0, 180.5] {
        let estimator = calibrated_at(width);
        let distance = estimator.calculate_distance(width);
        assert!(
            (distance - 60.0).abs() < TOLERANCE,
            "width {} gave {}",
            width,
            distance
        );
    }
}

#[test]
fn test_concrete_scenario() {
    let estimator = calibrated_at(105.0);
    let distance = estimator.calculate_distance(52.5);
    assert!((distance - 120.0).abs() < TOLERANCE, "distance {}", distance);
}

#[test]
fn test_distance_strictly_decreasing_in_width() {
    let estimator = calibrated_at(105.0);
    let widths = [10.0, 20.0, 52.5, 105.0, 150.0, 300.0];
    let distances: Vec<f64> = widths
        .iter()
        .map(|&w| estimator.calculate_distance(w))
        .collect();
    for pair in distances.windows(2) {
        assert!(pair[0] > pair[1], "{:?} not strictly decreasing", distances);
    }
}

#[test]
fn test_distance_zero_width_returns_sentinel() {
    let uncalibrated = DistanceEstimator::new_default();
    assert_eq!(uncalibrated.calculate_distance(0.0), 0.0);

    let estimator = calibrated_at(105.0);
    assert_eq!(estimator.calculate_distance(0.0), 0.0);
    assert!(estimator.distance(0.0).is_none());
}

#[test]
fn test_distance_before_calibration_returns_sentinel() {
    let mut estimator = DistanceEstimator::new_default();
    estimator.calibrate(105.0);
    assert_eq!(estimator.calculate_distance(105.0), 0.0);
    assert!(estimator.distance(105.0).is_none());
}

#[test]
fn test_distance_negative_or_nan_width_has_no_reading() {
    let estimator = calibrated_at(105.0);
    assert!(estimator.distance(-10.0).is_none());
    assert!(estimator.distance(f64::NAN).is_none());
    assert_eq!(estimator.calculate_distance(-10.0), 0.0);
}

#[test]
fn test_distance_grows_without_bound_as_width_shrinks() {
    let estimator = calibrated_at(105.0);
    assert!(estimator.calculate_distance(1e-6) > 1e9);
}

#[test]
fn test_progress_reporting() {
    let mut estimator = DistanceEstimator::new_default();
    assert_eq!(estimator.get_calibration_progress().as_tuple(), (0, 30, 0.0));

    for _ in 0..15 {
        estimator.calibrate(100.0);
    }
    let (current, total, percentage) = estimator.get_calibration_progress().as_tuple();
    assert_eq!(current, 15);
    assert_eq!(total, 30);
    assert!((percentage - 50.0).abs() < TOLERANCE);

    for _ in 0..15 {
        estimator.calibrate(100.0);
    }
    assert!(estimator.get_calibration_progress().is_complete());
    assert!((estimator.get_calibration_progress().percentage - 100.0).abs() < TOLERANCE);
}

#[test]
fn test_custom_target_frames() {
    let mut estimator = DistanceEstimator::new(small_config(3));
    assert!(!estimator.calibrate(105.0));
    assert!(!estimator.calibrate(105.0));
    assert!(estimator.calibrate(105.0));
    assert_eq!(estimator.sample_count(), 3);
}

#[test]
fn test_custom_reference_geometry() {
    let config = CalibrationConfig {
        known_distance_cm: 50.0,
        known_width_cm: 5.0,
        target_frames: 1,
        ..CalibrationConfig::default()
    };
    let mut estimator = DistanceEstimator::new(config);
    assert!(estimator.calibrate(100.0));
    // focal = 100 * 50 / 5 = 1000; distance at 200 px = 5 * 1000 / 200 = 25
    assert!((estimator.focal_length().unwrap() - 1000.0).abs() < TOLERANCE);
    assert!((estimator.calculate_distance(200.0) - 25.0).abs() < TOLERANCE);
}

/// Known hazard: a zero-width first sample seeds the focal length at zero.
/// The estimator keeps the raw behaviour; live pipelines gate such frames
/// through `MeasurementValidator` before calibrating.
#[test]
fn test_zero_width_first_sample_poisons_focal_length() {
    let mut estimator = DistanceEstimator::new_default();
    estimator.calibrate(0.0);
    assert_eq!(estimator.focal_length(), Some(0.0));
    assert_eq!(estimator.sample_count(), 1);

    // Subsequent good samples only recover 10% per frame
    estimator.calibrate(105.0);
    assert!((estimator.focal_length().unwrap() - 100.0).abs() < TOLERANCE);
}

#[test]
fn test_state_invariants_hold_after_every_sample() {
    let mut estimator = DistanceEstimator::new_default();
    assert_eq!(estimator.sample_count(), 0);
    assert!(estimator.focal_length().is_none());

    for _ in 0..35 {
        estimator.calibrate(105.0);
        let count = estimator.sample_count();
        // Focal length exists once any sample was taken
        assert_eq!(estimator.focal_length().is_some(), count >= 1);
        assert!(count <= 30, "count {}", count);
        assert_eq!(estimator.is_calibrated(), count == 30);
        assert!(estimator.get_calibration_progress().percentage <= 100.0);
    }
}
