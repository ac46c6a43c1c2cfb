// Warning policy - safe / too-close classification of distance estimates

use serde::{Deserialize, Serialize};

use crate::config::WarningConfig;

/// Outcome of classifying one distance estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceStatus {
    /// At or beyond the safety threshold
    Safe,
    /// Closer than the safety threshold; the renderer blurs the frame
    TooClose,
    /// No distance estimate available for this frame
    NoReading,
}

impl DistanceStatus {
    pub fn is_warning(&self) -> bool {
        matches!(self, DistanceStatus::TooClose)
    }
}

/// Threshold comparison against the minimum safe distance
#[derive(Debug, Clone, Copy)]
pub struct WarningPolicy {
    safety_threshold_cm: f64,
}

impl WarningPolicy {
    pub fn new(config: WarningConfig) -> Self {
        Self {
            safety_threshold_cm: config.safety_threshold_cm,
        }
    }

    /// `distance >= safety_threshold`; the threshold itself counts as safe
    pub fn is_safe(&self, distance_cm: f64) -> bool {
        distance_cm >= self.safety_threshold_cm
    }

    /// Classify an optional estimate, mapping `None` to `NoReading`
    pub fn classify(&self, distance_cm: Option<f64>) -> DistanceStatus {
        match distance_cm {
            None => DistanceStatus::NoReading,
            Some(d) if self.is_safe(d) => DistanceStatus::Safe,
            Some(_) => DistanceStatus::TooClose,
        }
    }

    pub fn safety_threshold_cm(&self) -> f64 {
        self.safety_threshold_cm
    }
}

impl Default for WarningPolicy {
    fn default() -> Self {
        Self::new(WarningConfig::default())
    }
}
