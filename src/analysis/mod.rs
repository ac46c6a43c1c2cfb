// Analysis module - per-frame distance monitoring pipeline
//
// This module turns one detector observation into one FrameReport:
// - Pipeline: IrisExtractor -> MeasurementValidator -> DistanceEstimator -> WarningPolicy
// - While calibrating, every accepted measurement is folded into the focal length
// - Once calibrated, every measurement yields a distance and a safe/too-close status
//
// The monitor is synchronous and owns its estimator; hosting loops call
// `process` once per frame and may stop at any time.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationProgress, DistanceEstimator, MeasurementValidator};
use crate::config::AppConfig;
use crate::error::{log_calibration_error, ErrorCode};

pub mod iris;
pub mod warning;

pub use iris::{FaceLandmarks, IrisExtractor, IrisMeasurement, Landmark, PixelPoint};
pub use warning::{DistanceStatus, WarningPolicy};

/// One frame as delivered by the landmark detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameObservation {
    pub frame_index: u64,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Landmarks of the first detected face, `None` when no face was found
    pub landmarks: Option<FaceLandmarks>,
}

/// Result of processing one frame
///
/// Serialized with a `kind` tag for CLI and fixture output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameReport {
    /// Detector found no face
    NoFace { frame_index: u64 },
    /// Frame could not be used (bad landmarks, bad size, unusable width)
    Rejected { frame_index: u64, reason: String },
    /// Calibration sample accepted, more needed
    Calibrating {
        frame_index: u64,
        progress: CalibrationProgress,
        measurement: IrisMeasurement,
    },
    /// This frame completed calibration
    CalibrationComplete {
        frame_index: u64,
        focal_length: f64,
        progress: CalibrationProgress,
        measurement: IrisMeasurement,
    },
    /// Distance estimate for a calibrated monitor
    Distance {
        frame_index: u64,
        distance_cm: Option<f64>,
        status: DistanceStatus,
        measurement: IrisMeasurement,
    },
}

impl FrameReport {
    pub fn frame_index(&self) -> u64 {
        match self {
            FrameReport::NoFace { frame_index }
            | FrameReport::Rejected { frame_index, .. }
            | FrameReport::Calibrating { frame_index, .. }
            | FrameReport::CalibrationComplete { frame_index, .. }
            | FrameReport::Distance { frame_index, .. } => *frame_index,
        }
    }

    /// Warning status, only present on distance reports
    pub fn status(&self) -> Option<DistanceStatus> {
        match self {
            FrameReport::Distance { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short label used by fixture expectations
    pub fn label(&self) -> &'static str {
        match self {
            FrameReport::NoFace { .. } => "no_face",
            FrameReport::Rejected { .. } => "rejected",
            FrameReport::Calibrating { .. } => "calibrating",
            FrameReport::CalibrationComplete { .. } => "calibration_complete",
            FrameReport::Distance { status, .. } => match status {
                DistanceStatus::Safe => "safe",
                DistanceStatus::TooClose => "too_close",
                DistanceStatus::NoReading => "no_reading",
            },
        }
    }
}

/// Running statistics over a monitoring session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorSummary {
    pub frames: u64,
    pub faces: u64,
    pub rejected: u64,
    pub calibration_frames: u64,
    pub distance_frames: u64,
    pub warning_frames: u64,
    pub focal_length: Option<f64>,
    pub min_distance_cm: Option<f64>,
    pub max_distance_cm: Option<f64>,
    pub last_distance_cm: Option<f64>,
}

impl MonitorSummary {
    fn record(&mut self, report: &FrameReport) {
        self.frames += 1;
        match report {
            FrameReport::NoFace { .. } => {}
            FrameReport::Rejected { .. } => {
                self.faces += 1;
                self.rejected += 1;
            }
            FrameReport::Calibrating { .. } => {
                self.faces += 1;
                self.calibration_frames += 1;
            }
            FrameReport::CalibrationComplete { focal_length, .. } => {
                self.faces += 1;
                self.calibration_frames += 1;
                self.focal_length = Some(*focal_length);
            }
            FrameReport::Distance {
                distance_cm,
                status,
                ..
            } => {
                self.faces += 1;
                self.distance_frames += 1;
                if status.is_warning() {
                    self.warning_frames += 1;
                }
                if let Some(d) = *distance_cm {
                    self.min_distance_cm = Some(self.min_distance_cm.map_or(d, |m| m.min(d)));
                    self.max_distance_cm = Some(self.max_distance_cm.map_or(d, |m| m.max(d)));
                    self.last_distance_cm = Some(d);
                }
            }
        }
    }
}

/// Per-frame pipeline owning the estimator and warning policy
pub struct DistanceMonitor {
    extractor: IrisExtractor,
    estimator: DistanceEstimator,
    policy: WarningPolicy,
    mirror: bool,
    summary: MonitorSummary,
    last_status: Option<DistanceStatus>,
}

impl DistanceMonitor {
    /// Create an uncalibrated monitor from the application config
    pub fn new(config: &AppConfig) -> Self {
        Self::with_estimator(config, DistanceEstimator::new(config.calibration))
    }

    /// Create a monitor around an existing (possibly calibrated) estimator
    pub fn with_estimator(config: &AppConfig, estimator: DistanceEstimator) -> Self {
        Self {
            extractor: IrisExtractor::from_config(&config.detector),
            estimator,
            policy: WarningPolicy::new(config.warning),
            mirror: config.camera.mirror,
            summary: MonitorSummary::default(),
            last_status: None,
        }
    }

    /// Process one observation
    pub fn process(&mut self, observation: &FrameObservation) -> FrameReport {
        let report = self.evaluate(observation);
        self.summary.record(&report);
        report
    }

    fn evaluate(&mut self, observation: &FrameObservation) -> FrameReport {
        let frame_index = observation.frame_index;

        let landmarks = match observation.landmarks.as_ref() {
            Some(landmarks) => landmarks,
            None => return FrameReport::NoFace { frame_index },
        };

        let extracted = if self.mirror {
            self.extractor.extract(
                &landmarks.mirrored(),
                observation.frame_width,
                observation.frame_height,
            )
        } else {
            self.extractor
                .extract(landmarks, observation.frame_width, observation.frame_height)
        };

        let measurement = match extracted {
            Ok(measurement) => measurement,
            Err(err) => {
                warn!(
                    "[DistanceMonitor] Frame {} rejected: code={} {}",
                    frame_index,
                    err.code(),
                    err.message()
                );
                return FrameReport::Rejected {
                    frame_index,
                    reason: err.message(),
                };
            }
        };

        if self.estimator.is_calibrated() {
            self.estimate(frame_index, measurement)
        } else {
            self.calibrate(frame_index, measurement)
        }
    }

    fn calibrate(&mut self, frame_index: u64, measurement: IrisMeasurement) -> FrameReport {
        if let Err(err) = MeasurementValidator::validate(measurement.pixel_width) {
            log_calibration_error(&err, &format!("calibration sample {}", frame_index));
            return FrameReport::Rejected {
                frame_index,
                reason: err.message(),
            };
        }

        let complete = self.estimator.calibrate(measurement.pixel_width);
        let progress = self.estimator.get_calibration_progress();

        match self.estimator.focal_length() {
            Some(focal_length) if complete => FrameReport::CalibrationComplete {
                frame_index,
                focal_length,
                progress,
                measurement,
            },
            _ => FrameReport::Calibrating {
                frame_index,
                progress,
                measurement,
            },
        }
    }

    fn estimate(&mut self, frame_index: u64, measurement: IrisMeasurement) -> FrameReport {
        let distance_cm = self.estimator.distance(measurement.pixel_width);
        let status = self.policy.classify(distance_cm);

        if self.last_status != Some(status) {
            match status {
                DistanceStatus::TooClose => warn!(
                    "[DistanceMonitor] TOO CLOSE at frame {}: {:.1} cm (threshold {:.1} cm)",
                    frame_index,
                    distance_cm.unwrap_or_default(),
                    self.policy.safety_threshold_cm()
                ),
                DistanceStatus::Safe => info!(
                    "[DistanceMonitor] Safe distance at frame {}: {:.1} cm",
                    frame_index,
                    distance_cm.unwrap_or_default()
                ),
                DistanceStatus::NoReading => {
                    debug!("[DistanceMonitor] No reading at frame {}", frame_index)
                }
            }
            self.last_status = Some(status);
        }

        FrameReport::Distance {
            frame_index,
            distance_cm,
            status,
            measurement,
        }
    }

    pub fn estimator(&self) -> &DistanceEstimator {
        &self.estimator
    }

    pub fn policy(&self) -> &WarningPolicy {
        &self.policy
    }

    pub fn summary(&self) -> &MonitorSummary {
        &self.summary
    }

    pub fn into_summary(self) -> MonitorSummary {
        self.summary
    }
}
