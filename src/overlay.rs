// Overlay plan - renderer-agnostic drawing commands for one frame
//
// The monitor never touches pixels. Each FrameReport is turned into an
// ordered list of commands that a renderer (OpenCV window, GPU preview,
// test harness) executes top to bottom. Blur always comes first so text
// and markers are drawn on top of the blurred frame.

use serde::{Deserialize, Serialize};

use crate::analysis::{DistanceStatus, FrameReport, IrisMeasurement};
use crate::config::{Bgr, OverlayConfig};

/// Text origin of status lines
pub const STATUS_ORIGIN: (i32, i32) = (10, 30);
/// Text origin of the large too-close banner
pub const WARNING_ORIGIN: (i32, i32) = (50, 100);
pub const IRIS_MARKER_RADIUS: i32 = 5;

const NO_FACE_COLOR: Bgr = [0, 0, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Font {
    Simplex,
    Duplex,
}

/// One drawing instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OverlayCommand {
    /// Gaussian blur of the whole frame
    Blur { kernel: [u32; 2] },
    Text {
        content: String,
        origin: (i32, i32),
        font: Font,
        scale: f64,
        thickness: i32,
        color: Bgr,
    },
    Circle {
        center: (i32, i32),
        radius: i32,
        filled: bool,
        color: Bgr,
    },
    Line {
        from: (i32, i32),
        to: (i32, i32),
        thickness: i32,
        color: Bgr,
    },
}

/// Ordered drawing commands for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayPlan {
    pub commands: Vec<OverlayCommand>,
}

impl OverlayPlan {
    /// Build the overlay for a processed frame
    ///
    /// # Arguments
    /// * `report` - Result of `DistanceMonitor::process`
    /// * `style` - Colors and blur kernel
    ///
    /// # Returns
    /// Commands in draw order. Rejected frames produce an empty plan.
    pub fn for_report(report: &FrameReport, style: &OverlayConfig) -> Self {
        let mut plan = Self::default();

        match report {
            FrameReport::NoFace { .. } => {
                plan.status_text("Face not detected".to_string(), 0.7, NO_FACE_COLOR);
            }
            FrameReport::Rejected { .. } => {}
            FrameReport::Calibrating { progress, .. }
            | FrameReport::CalibrationComplete { progress, .. } => {
                plan.status_text(progress.display_text(), 0.7, style.calibration_color);
            }
            FrameReport::Distance {
                distance_cm,
                status,
                measurement,
                ..
            } => {
                if *status == DistanceStatus::TooClose {
                    plan.commands.push(OverlayCommand::Blur {
                        kernel: style.blur_kernel_size,
                    });
                    plan.commands.push(OverlayCommand::Text {
                        content: "TOO CLOSE!".to_string(),
                        origin: WARNING_ORIGIN,
                        font: Font::Duplex,
                        scale: 2.0,
                        thickness: 4,
                        color: style.warning_color,
                    });
                }

                if let Some(distance) = distance_cm {
                    let color = if *status == DistanceStatus::Safe {
                        style.safe_color
                    } else {
                        style.warning_color
                    };
                    plan.status_text(format!("Distance: {:.1} cm", distance), 1.0, color);
                }

                plan.iris_markers(measurement, style);
            }
        }

        plan
    }

    fn status_text(&mut self, content: String, scale: f64, color: Bgr) {
        self.commands.push(OverlayCommand::Text {
            content,
            origin: STATUS_ORIGIN,
            font: Font::Simplex,
            scale,
            thickness: 2,
            color,
        });
    }

    fn iris_markers(&mut self, measurement: &IrisMeasurement, style: &OverlayConfig) {
        let left = measurement.left_center.truncated();
        let right = measurement.right_center.truncated();
        for center in [left, right] {
            self.commands.push(OverlayCommand::Circle {
                center,
                radius: IRIS_MARKER_RADIUS,
                filled: true,
                color: style.iris_color,
            });
        }
        self.commands.push(OverlayCommand::Line {
            from: left,
            to: right,
            thickness: 2,
            color: style.line_color,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// True when the frame must be blurred before drawing
    pub fn blurs_frame(&self) -> bool {
        matches!(self.commands.first(), Some(OverlayCommand::Blur { .. }))
    }
}
