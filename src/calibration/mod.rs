// Calibration module - focal length calibration and distance estimation
//
// This module provides the core of the monitor:
// 1. CalibrationState: Uncalibrated -> Calibrating -> Calibrated phases
// 2. DistanceEstimator: calibrate / calculate_distance / get_calibration_progress
// 3. MeasurementValidator: gate for live pixel-width measurements
//
// The calibration workflow:
// 1. Create DistanceEstimator from CalibrationConfig
// 2. Feed one iris pixel width per frame to calibrate() until it returns true
// 3. Call calculate_distance() on every later frame

pub mod procedure;
pub mod progress;
pub mod state;
pub mod validation;

pub use procedure::DistanceEstimator;
pub use progress::CalibrationProgress;
pub use state::CalibrationState;
pub use validation::MeasurementValidator;
