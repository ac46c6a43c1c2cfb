// Progress tracking for focal length calibration
//
// This module provides the progress snapshot shown to the user while
// calibration samples are collected.

use serde::{Deserialize, Serialize};

/// Progress information for the calibration step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProgress {
    /// Number of samples folded into the focal length so far
    pub samples_collected: u32,
    /// Total samples needed to finish calibration
    pub samples_needed: u32,
    /// `100 * samples_collected / samples_needed`
    pub percentage: f64,
}

impl CalibrationProgress {
    /// Create a new progress snapshot
    ///
    /// # Arguments
    /// * `samples_collected` - Number of samples observed so far
    /// * `samples_needed` - Total samples needed
    pub fn new(samples_collected: u32, samples_needed: u32) -> Self {
        let percentage = if samples_needed == 0 {
            0.0
        } else {
            100.0 * samples_collected as f64 / samples_needed as f64
        };
        Self {
            samples_collected,
            samples_needed,
            percentage,
        }
    }

    /// Check if calibration is complete
    pub fn is_complete(&self) -> bool {
        self.samples_collected >= self.samples_needed
    }

    /// `(sample_count, target_frames, percentage)`
    pub fn as_tuple(&self) -> (u32, u32, f64) {
        (self.samples_collected, self.samples_needed, self.percentage)
    }

    /// Status line shown on screen while calibrating
    pub fn display_text(&self) -> String {
        format!(
            "Calibrating: {}/{} ({:.0}%)",
            self.samples_collected, self.samples_needed, self.percentage
        )
    }
}
