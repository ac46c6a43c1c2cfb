//! Frame source abstractions feeding the distance monitor.
//!
//! A source produces one [`FrameObservation`] per call until it is
//! exhausted. Recorded sessions are replayed from JSON lines and synthetic
//! sessions are generated from a distance profile, so the pipeline can be
//! driven without a camera or landmark detector attached.

use crate::analysis::{FaceLandmarks, FrameObservation, Landmark};
use crate::config::DetectorConfig;
use crate::error::FrameError;

pub mod replay;
pub mod synthetic;

pub use replay::ReplaySource;
pub use synthetic::{SyntheticPattern, SyntheticSource, SyntheticSpec};

/// Landmark count of a refined face mesh
pub const REFINED_MESH_POINTS: usize = 478;

/// Normalized offset of the iris ring landmarks around their center
const IRIS_RING_RADIUS: f64 = 0.008;

/// Trait implemented by anything that can feed frames to the monitor.
pub trait FrameSource: Send {
    /// Next observation, or `Ok(None)` once the source is exhausted
    fn next_frame(&mut self) -> Result<Option<FrameObservation>, FrameError>;

    /// Human readable description for logs and CLI output
    fn describe(&self) -> String;
}

impl FrameSource for Box<dyn FrameSource> {
    fn next_frame(&mut self) -> Result<Option<FrameObservation>, FrameError> {
        (**self).next_frame()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Build a face mesh whose iris centers sit `pixel_width` pixels apart
///
/// Both irises are placed on the horizontal center line of the frame,
/// symmetric around the middle, with their ring landmarks on a small
/// diamond so each center is the mean of four distinct points. Every other
/// landmark sits at the frame center.
///
/// # Arguments
/// * `pixel_width` - Desired inter-iris distance in pixels (clamped at 0)
/// * `frame_width` / `frame_height` - Frame size the width is measured in
/// * `detector` - Supplies the iris landmark indices
pub fn landmarks_for_width(
    pixel_width: f64,
    frame_width: u32,
    frame_height: u32,
    detector: &DetectorConfig,
) -> FaceLandmarks {
    let max_index = detector
        .left_iris
        .iter()
        .chain(detector.right_iris.iter())
        .copied()
        .max()
        .unwrap_or(0);
    let len = REFINED_MESH_POINTS.max(max_index + 1);
    let mut points = vec![Landmark::new(0.5, 0.5, 0.0); len];

    let half = if frame_width == 0 {
        0.0
    } else {
        pixel_width.max(0.0) / 2.0 / frame_width as f64
    };
    let dy = if frame_height == 0 {
        0.0
    } else {
        IRIS_RING_RADIUS * frame_width as f64 / frame_height as f64
    };
    let ring = [
        (IRIS_RING_RADIUS, 0.0),
        (0.0, dy),
        (-IRIS_RING_RADIUS, 0.0),
        (0.0, -dy),
    ];

    let mut place = |indices: &[usize], center_x: f64| {
        for (&index, (dx, dy)) in indices.iter().zip(ring.iter().cycle()) {
            points[index] = Landmark::new(center_x + dx, 0.5 + dy, 0.0);
        }
    };
    place(&detector.left_iris, 0.5 + half);
    place(&detector.right_iris, 0.5 - half);

    FaceLandmarks::new(points)
}
