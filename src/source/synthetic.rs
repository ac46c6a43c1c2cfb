// Synthetic source - deterministic sessions generated from a distance profile
//
// A session holds the calibration distance for `hold_frames` frames so the
// monitor can calibrate, then ramps linearly from the pattern's start to end
// distance. Widths follow the pinhole model `width = W * f / d` for the
// configured focal length, plus optional seeded jitter.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{landmarks_for_width, FrameSource};
use crate::analysis::FrameObservation;
use crate::config::{AppConfig, DetectorConfig};
use crate::error::FrameError;

/// Supported distance profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticPattern {
    /// Stay at the calibration distance
    Steady,
    /// Lean in towards the screen, crossing the safety threshold
    Approach,
    /// Start too close and move back to a safe distance
    Retreat,
}

impl SyntheticPattern {
    /// `(start_cm, end_cm)` of the ramp that follows calibration
    pub fn profile(&self, known_distance_cm: f64) -> (f64, f64) {
        match self {
            SyntheticPattern::Steady => (known_distance_cm, known_distance_cm),
            SyntheticPattern::Approach => (known_distance_cm, 35.0),
            SyntheticPattern::Retreat => (35.0, 80.0),
        }
    }
}

impl fmt::Display for SyntheticPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyntheticPattern::Steady => "steady",
            SyntheticPattern::Approach => "approach",
            SyntheticPattern::Retreat => "retreat",
        };
        f.write_str(name)
    }
}

impl FromStr for SyntheticPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "steady" => Ok(SyntheticPattern::Steady),
            "approach" => Ok(SyntheticPattern::Approach),
            "retreat" => Ok(SyntheticPattern::Retreat),
            other => Err(format!(
                "unknown pattern '{}' (expected steady, approach or retreat)",
                other
            )),
        }
    }
}

/// Parameters of a synthetic session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    pub pattern: SyntheticPattern,
    /// Total number of frames to emit
    pub frames: u64,
    /// Frames held at the calibration distance before the ramp starts
    #[serde(default = "default_hold_frames")]
    pub hold_frames: u64,
    /// Focal length (pixels) of the simulated camera
    #[serde(default = "default_focal_length")]
    pub focal_length: f64,
    /// Peak jitter applied to each width, in pixels
    #[serde(default)]
    pub jitter_px: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_hold_frames() -> u64 {
    30
}

fn default_focal_length() -> f64 {
    600.0
}

fn default_seed() -> u64 {
    0x5EED_0060
}

impl SyntheticSpec {
    pub fn new(pattern: SyntheticPattern, frames: u64) -> Self {
        Self {
            pattern,
            frames,
            hold_frames: default_hold_frames(),
            focal_length: default_focal_length(),
            jitter_px: 0.0,
            seed: default_seed(),
        }
    }
}

/// Frame source emitting a scripted session
pub struct SyntheticSource {
    spec: SyntheticSpec,
    rng: StdRng,
    detector: DetectorConfig,
    frame_size: (u32, u32),
    known_distance_cm: f64,
    known_width_cm: f64,
    frame_index: u64,
}

impl SyntheticSource {
    pub fn new(spec: SyntheticSpec, config: &AppConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(spec.seed),
            spec,
            detector: config.detector.clone(),
            frame_size: (config.camera.frame_width, config.camera.frame_height),
            known_distance_cm: config.calibration.known_distance_cm,
            known_width_cm: config.calibration.known_width_cm,
            frame_index: 0,
        }
    }

    /// Scripted true distance of a frame (before jitter)
    pub fn distance_at(&self, frame_index: u64) -> f64 {
        if frame_index < self.spec.hold_frames {
            return self.known_distance_cm;
        }

        let (start, end) = self.spec.pattern.profile(self.known_distance_cm);
        let ramp_frames = self.spec.frames.saturating_sub(self.spec.hold_frames);
        if ramp_frames <= 1 {
            return end;
        }
        let t = (frame_index - self.spec.hold_frames) as f64 / (ramp_frames - 1) as f64;
        start + (end - start) * t.min(1.0)
    }

    /// Pixel width of the feature at `distance_cm` for the simulated camera
    pub fn width_at_distance(&self, distance_cm: f64) -> f64 {
        self.known_width_cm * self.spec.focal_length / distance_cm
    }

    fn jitter(&mut self) -> f64 {
        if self.spec.jitter_px <= 0.0 {
            return 0.0;
        }
        // Mean of three uniforms: bell-shaped, bounded by the peak jitter
        let sum: f64 = (0..3)
            .map(|_| self.rng.gen_range(-1.0..1.0))
            .sum::<f64>();
        sum / 3.0 * self.spec.jitter_px
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<FrameObservation>, FrameError> {
        if self.frame_index >= self.spec.frames {
            return Ok(None);
        }

        let distance = self.distance_at(self.frame_index);
        let width = (self.width_at_distance(distance) + self.jitter()).max(0.0);
        let (frame_width, frame_height) = self.frame_size;

        let observation = FrameObservation {
            frame_index: self.frame_index,
            frame_width,
            frame_height,
            landmarks: Some(landmarks_for_width(
                width,
                frame_width,
                frame_height,
                &self.detector,
            )),
        };
        self.frame_index += 1;
        Ok(Some(observation))
    }

    fn describe(&self) -> String {
        format!(
            "synthetic:{} ({} frames, seed {:#x})",
            self.spec.pattern, self.spec.frames, self.spec.seed
        )
    }
}
