// Iris feature extraction - inter-iris pixel width from face landmarks
//
// The landmark detector returns normalized [0, 1] coordinates. Each iris
// center is the mean of its four ring landmarks after scaling to pixels, and
// the measurement handed to the estimator is the Euclidean distance between
// the two centers (interpupillary distance in pixels).

use serde::{Deserialize, Serialize};

use crate::config::DetectorConfig;
use crate::error::FrameError;

/// Single normalized landmark from the face mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// All landmarks of the single tracked face
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceLandmarks {
    pub points: Vec<Landmark>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Landmarks as seen in a horizontally flipped frame
    pub fn mirrored(&self) -> Self {
        Self {
            points: self
                .points
                .iter()
                .map(|p| Landmark::new(1.0 - p.x, p.y, p.z))
                .collect(),
        }
    }
}

/// Point in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &PixelPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Integer coordinates for drawing, truncated toward zero
    pub fn truncated(&self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }
}

/// Per-frame iris measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrisMeasurement {
    /// Distance between iris centers in pixels
    pub pixel_width: f64,
    pub left_center: PixelPoint,
    pub right_center: PixelPoint,
}

/// Extracts iris centers and inter-iris width from landmarks
#[derive(Debug, Clone)]
pub struct IrisExtractor {
    left_iris: Vec<usize>,
    right_iris: Vec<usize>,
}

impl IrisExtractor {
    /// Create an extractor for the given iris ring indices
    pub fn new(left_iris: Vec<usize>, right_iris: Vec<usize>) -> Self {
        Self {
            left_iris,
            right_iris,
        }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(config.left_iris.clone(), config.right_iris.clone())
    }

    /// Measure the inter-iris width in pixels
    ///
    /// # Arguments
    /// * `landmarks` - Normalized face landmarks
    /// * `frame_width` / `frame_height` - Frame size used to scale coordinates
    ///
    /// # Errors
    /// * `FrameError::InvalidFrameSize` - a frame dimension is zero
    /// * `FrameError::LandmarkIndexOutOfRange` - configured index missing from `landmarks`
    pub fn extract(
        &self,
        landmarks: &FaceLandmarks,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<IrisMeasurement, FrameError> {
        if frame_width == 0 || frame_height == 0 {
            return Err(FrameError::InvalidFrameSize {
                width: frame_width,
                height: frame_height,
            });
        }

        let left_center = Self::center(landmarks, &self.left_iris, frame_width, frame_height)?;
        let right_center = Self::center(landmarks, &self.right_iris, frame_width, frame_height)?;

        Ok(IrisMeasurement {
            pixel_width: left_center.distance_to(&right_center),
            left_center,
            right_center,
        })
    }

    /// Mean pixel position of the given landmark indices
    fn center(
        landmarks: &FaceLandmarks,
        indices: &[usize],
        frame_width: u32,
        frame_height: u32,
    ) -> Result<PixelPoint, FrameError> {
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        for &index in indices {
            let point = landmarks
                .points
                .get(index)
                .ok_or(FrameError::LandmarkIndexOutOfRange {
                    index,
                    len: landmarks.len(),
                })?;
            sum_x += point.x * frame_width as f64;
            sum_y += point.y * frame_height as f64;
        }

        let n = indices.len().max(1) as f64;
        Ok(PixelPoint::new(sum_x / n, sum_y / n))
    }
}
