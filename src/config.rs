//! Configuration management for the distance monitor
//!
//! This module provides runtime configuration loading from JSON files,
//! so calibration references, the safety threshold and detector landmark
//! indices can be adjusted without recompilation. Every section has a
//! `Default` matching the reference setup (60 cm calibration distance,
//! 6.3 cm interpupillary distance, 50 cm safety threshold).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Default location of the JSON config file on desktop
pub const DEFAULT_CONFIG_PATH: &str = "assets/monitor_config.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub warning: WarningConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
}

/// Focal length calibration parameters
///
/// Immutable once handed to a `DistanceEstimator`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Distance (cm) the user holds during calibration
    pub known_distance_cm: f64,
    /// Physical width (cm) of the measured feature (interpupillary distance)
    pub known_width_cm: f64,
    /// Number of samples required to complete calibration
    pub target_frames: u32,
    /// History weight of the focal length moving average
    pub smoothing_alpha: f64,
    /// Log calibration progress every N samples (0 disables)
    pub log_every_n_frames: u32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            known_distance_cm: 60.0,
            known_width_cm: 6.3,
            target_frames: 30,
            smoothing_alpha: 0.9,
            log_every_n_frames: 10,
        }
    }
}

/// Warning policy parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarningConfig {
    /// Minimum safe distance in cm (inclusive)
    pub safety_threshold_cm: f64,
}

impl Default for WarningConfig {
    fn default() -> Self {
        Self {
            safety_threshold_cm: 50.0,
        }
    }
}

/// Face landmark detector parameters
///
/// Only the iris indices are consumed here; the remaining fields are passed
/// through to whichever external detector produces the landmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub left_iris: Vec<usize>,
    pub right_iris: Vec<usize>,
    pub max_num_faces: u32,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    /// Iris landmarks (indices 468+) are only produced with refinement enabled
    pub refine_landmarks: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            left_iris: vec![474, 475, 476, 477],
            right_iris: vec![469, 470, 471, 472],
            max_num_faces: 1,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            refine_landmarks: true,
        }
    }
}

/// Camera capture parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Flip frames horizontally so the preview behaves like a mirror
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            frame_width: 640,
            frame_height: 480,
            mirror: true,
        }
    }
}

/// BGR color triple as used by the renderer
pub type Bgr = [u8; 3];

/// Overlay styling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Gaussian kernel size applied when the user is too close
    pub blur_kernel_size: [u32; 2],
    pub warning_color: Bgr,
    pub safe_color: Bgr,
    pub iris_color: Bgr,
    pub line_color: Bgr,
    pub calibration_color: Bgr,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            blur_kernel_size: [35, 35],
            warning_color: [0, 0, 255],
            safe_color: [0, 255, 0],
            iris_color: [255, 0, 0],
            line_color: [255, 255, 0],
            calibration_color: [255, 255, 0],
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration. If the file doesn't exist or the JSON is
    /// invalid, a warning is logged and the default config is returned.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default desktop location
    pub fn load() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    /// Check that every value can drive the monitor
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cal = &self.calibration;
        if !(cal.known_distance_cm.is_finite() && cal.known_distance_cm > 0.0) {
            return Err(ConfigError::invalid(
                "calibration.known_distance_cm",
                format!("must be positive, got {}", cal.known_distance_cm),
            ));
        }
        if !(cal.known_width_cm.is_finite() && cal.known_width_cm > 0.0) {
            return Err(ConfigError::invalid(
                "calibration.known_width_cm",
                format!("must be positive, got {}", cal.known_width_cm),
            ));
        }
        if cal.target_frames == 0 {
            return Err(ConfigError::invalid(
                "calibration.target_frames",
                "must be at least 1",
            ));
        }
        if !(cal.smoothing_alpha > 0.0 && cal.smoothing_alpha < 1.0) {
            return Err(ConfigError::invalid(
                "calibration.smoothing_alpha",
                format!("must lie in (0, 1), got {}", cal.smoothing_alpha),
            ));
        }
        if !self.warning.safety_threshold_cm.is_finite() {
            return Err(ConfigError::invalid(
                "warning.safety_threshold_cm",
                "must be finite",
            ));
        }
        if self.detector.left_iris.is_empty() {
            return Err(ConfigError::invalid("detector.left_iris", "no landmark indices"));
        }
        if self.detector.right_iris.is_empty() {
            return Err(ConfigError::invalid(
                "detector.right_iris",
                "no landmark indices",
            ));
        }
        if self.camera.frame_width == 0 || self.camera.frame_height == 0 {
            return Err(ConfigError::invalid(
                "camera",
                format!(
                    "frame size must be non-zero, got {}x{}",
                    self.camera.frame_width, self.camera.frame_height
                ),
            ));
        }
        Ok(())
    }
}
