// Measurement validation for calibration
//
// The estimator folds every value it is given into the running focal length,
// so a single zero-width frame would drag the average towards zero. Callers
// that feed live detector output gate measurements through this validator
// first.

use crate::error::CalibrationError;

/// Validator for iris pixel-width measurements
pub struct MeasurementValidator;

impl MeasurementValidator {
    /// Validate a single pixel-width measurement
    ///
    /// # Returns
    /// * `Ok(())` - Measurement usable
    /// * `Err(CalibrationError::InvalidMeasurement)` - zero, negative or non-finite width
    pub fn validate(pixel_width: f64) -> Result<(), CalibrationError> {
        if !pixel_width.is_finite() {
            return Err(CalibrationError::InvalidMeasurement {
                reason: format!("pixel width {} is not finite", pixel_width),
            });
        }

        if pixel_width <= 0.0 {
            return Err(CalibrationError::InvalidMeasurement {
                reason: format!("pixel width {} must be positive", pixel_width),
            });
        }

        Ok(())
    }
}
