// DistanceEstimator - focal length calibration and monocular distance
//
// Pinhole camera model with similar triangles:
//   focal_length = pixel_width * known_distance / known_width   (calibration)
//   distance     = known_width * focal_length / pixel_width     (estimation)
//
// Calibration collects `target_frames` pixel-width samples while the user
// sits at `known_distance`, smoothing the focal length estimates with an
// exponential moving average to damp landmark jitter. Once calibrated the
// estimator is read-only.

use log::{debug, info};

use crate::calibration::progress::CalibrationProgress;
use crate::calibration::state::CalibrationState;
use crate::config::CalibrationConfig;

/// Calibrator and distance estimator
#[derive(Debug, Clone)]
pub struct DistanceEstimator {
    config: CalibrationConfig,
    state: CalibrationState,
}

impl DistanceEstimator {
    /// Create an uncalibrated estimator
    ///
    /// # Arguments
    /// * `config` - Reference distance/width, target frame count and smoothing factor
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            state: CalibrationState::new(),
        }
    }

    /// Create with the default reference setup (60 cm, 6.3 cm IPD, 30 frames)
    pub fn new_default() -> Self {
        Self::new(CalibrationConfig::default())
    }

    /// Fold one pixel-width sample into the focal length estimate
    ///
    /// # Arguments
    /// * `pixel_width` - Inter-iris distance in pixels for the current frame
    ///
    /// # Returns
    /// `true` once calibration is complete (and on every later call, which
    /// leaves the state untouched), `false` while samples are still needed.
    ///
    /// # Note
    /// No validation happens here. A zero width produces a zero candidate
    /// that drags the running average down; use `MeasurementValidator` on
    /// live input.
    pub fn calibrate(&mut self, pixel_width: f64) -> bool {
        if self.state.is_calibrated() {
            return true;
        }

        let candidate = self.focal_length_candidate(pixel_width);
        self.state = self.state.advance(
            candidate,
            self.config.smoothing_alpha,
            self.config.target_frames,
        );

        let collected = self.sample_count();
        debug!(
            "[DistanceEstimator] Sample {} candidate {:.2} -> focal {:?}",
            collected,
            candidate,
            self.state.focal_length()
        );

        if self.state.is_calibrated() {
            info!(
                "[DistanceEstimator] Calibration complete! Focal length: {:.2} px",
                self.state.focal_length().unwrap_or_default()
            );
            return true;
        }

        let every = self.config.log_every_n_frames;
        if every > 0 && collected % every == 0 {
            info!(
                "[DistanceEstimator] Calibration progress {}/{}",
                collected, self.config.target_frames
            );
        }

        false
    }

    /// Estimate distance in centimeters
    ///
    /// # Returns
    /// `known_width * focal_length / pixel_width`, or `0.0` when not yet
    /// calibrated or when `pixel_width` is not a positive finite number.
    /// Prefer `distance()` where "no reading" must be told apart.
    pub fn calculate_distance(&self, pixel_width: f64) -> f64 {
        self.distance(pixel_width).unwrap_or(0.0)
    }

    /// Estimate distance in centimeters, `None` when no estimate is available
    pub fn distance(&self, pixel_width: f64) -> Option<f64> {
        let focal_length = match self.state {
            CalibrationState::Calibrated { focal_length } => focal_length,
            _ => return None,
        };

        if !(pixel_width.is_finite() && pixel_width > 0.0) {
            return None;
        }

        Some(self.config.known_width_cm * focal_length / pixel_width)
    }

    /// Current progress: samples collected, samples needed and percentage
    pub fn get_calibration_progress(&self) -> CalibrationProgress {
        CalibrationProgress::new(self.sample_count(), self.config.target_frames)
    }

    /// Whether calibration has completed
    pub fn is_calibrated(&self) -> bool {
        self.state.is_calibrated()
    }

    /// Focal length estimate in pixels, once at least one sample was taken
    pub fn focal_length(&self) -> Option<f64> {
        self.state.focal_length()
    }

    /// Number of samples folded into the estimate
    pub fn sample_count(&self) -> u32 {
        self.state.sample_count(self.config.target_frames)
    }

    /// Current calibration phase
    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// Calibration parameters this estimator was built with
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    fn focal_length_candidate(&self, pixel_width: f64) -> f64 {
        pixel_width * self.config.known_distance_cm / self.config.known_width_cm
    }
}

impl Default for DistanceEstimator {
    fn default() -> Self {
        Self::new_default()
    }
}

#[cfg(test)]
#[path = "procedure_tests.rs"]
mod tests;
