// Calibration error types and constants

use crate::error::ErrorCode;
use log::warn;
use std::fmt;

/// Calibration error code constants
pub struct CalibrationErrorCodes {}

impl CalibrationErrorCodes {
    /// A pixel-width measurement was unusable (zero, negative or non-finite)
    pub const INVALID_MEASUREMENT: i32 = 2001;
}

/// Log a calibration error with structured context
///
/// Skipped calibration samples are recoverable, so this logs at warn level.
pub fn log_calibration_error(err: &CalibrationError, context: &str) {
    warn!(
        "Calibration error in {}: code={}, component=DistanceEstimator, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Calibration-related errors
///
/// The estimator operations themselves never fail; these errors are raised
/// by the boundary layer that validates measurements before handing them to
/// the estimator.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Measurement rejected before reaching the estimator
    InvalidMeasurement { reason: String },
}

impl ErrorCode for CalibrationError {
    fn code(&self) -> i32 {
        match self {
            CalibrationError::InvalidMeasurement { .. } => {
                CalibrationErrorCodes::INVALID_MEASUREMENT
            }
        }
    }

    fn message(&self) -> String {
        match self {
            CalibrationError::InvalidMeasurement { reason } => {
                format!("Invalid measurement: {}", reason)
            }
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CalibrationError {}
