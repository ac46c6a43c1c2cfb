// CalibrationState - focal length calibration state machine
//
// The estimator moves through three phases:
// Uncalibrated -> Calibrating { focal_length, samples } -> Calibrated { focal_length }
//
// A focal length exists exactly when at least one sample has been observed,
// and the Calibrated phase is terminal: there is no re-calibration path.

use serde::Serialize;

/// Calibration phase of a `DistanceEstimator`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CalibrationState {
    /// No sample observed yet
    #[default]
    Uncalibrated,
    /// Collecting samples; `samples` is always at least 1
    Calibrating { focal_length: f64, samples: u32 },
    /// Target sample count reached; focal length is frozen
    Calibrated { focal_length: f64 },
}

impl CalibrationState {
    /// Fresh state with no focal length
    pub fn new() -> Self {
        Self::default()
    }

    /// Current focal length estimate in pixels, if any sample was observed
    pub fn focal_length(&self) -> Option<f64> {
        match *self {
            CalibrationState::Uncalibrated => None,
            CalibrationState::Calibrating { focal_length, .. }
            | CalibrationState::Calibrated { focal_length } => Some(focal_length),
        }
    }

    /// Number of samples folded into the estimate
    ///
    /// A calibrated state always reports exactly `target_frames`.
    pub fn sample_count(&self, target_frames: u32) -> u32 {
        match *self {
            CalibrationState::Uncalibrated => 0,
            CalibrationState::Calibrating { samples, .. } => samples,
            CalibrationState::Calibrated { .. } => target_frames,
        }
    }

    /// Whether calibration has completed
    pub fn is_calibrated(&self) -> bool {
        matches!(self, CalibrationState::Calibrated { .. })
    }

    /// Fold one focal length candidate into the state
    ///
    /// The first candidate seeds the estimate; later candidates are blended
    /// with an exponential moving average weighted `alpha` towards history.
    /// A calibrated state is returned unchanged.
    pub(crate) fn advance(self, candidate: f64, alpha: f64, target_frames: u32) -> Self {
        let (focal_length, samples) = match self {
            CalibrationState::Calibrated { .. } => return self,
            CalibrationState::Uncalibrated => (candidate, 1),
            CalibrationState::Calibrating {
                focal_length,
                samples,
            } => (
                alpha * focal_length + (1.0 - alpha) * candidate,
                samples.saturating_add(1),
            ),
        };

        if samples >= target_frames {
            CalibrationState::Calibrated { focal_length }
        } else {
            CalibrationState::Calibrating {
                focal_length,
                samples,
            }
        }
    }
}
