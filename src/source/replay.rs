// Replay source - recorded sessions stored as JSON lines
//
// Each non-empty line is one frame. Two shapes are accepted:
//   {"width":640,"height":480,"landmarks":[[x,y,z],...]}   full detector output
//   {"width":640,"height":480,"iris_pixel_width":105.0}    measured width only
// A line with neither (or "landmarks": null) is a frame without a face.
// Lines starting with '#' are comments. Width and height fall back to the
// camera config when omitted.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;

use super::{landmarks_for_width, FrameSource};
use crate::analysis::{FaceLandmarks, FrameObservation, Landmark};
use crate::config::{AppConfig, DetectorConfig};
use crate::error::FrameError;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LandmarkRecord {
    Triple([f64; 3]),
    Pair([f64; 2]),
    Object(Landmark),
}

impl From<LandmarkRecord> for Landmark {
    fn from(record: LandmarkRecord) -> Self {
        match record {
            LandmarkRecord::Triple([x, y, z]) => Landmark::new(x, y, z),
            LandmarkRecord::Pair([x, y]) => Landmark::new(x, y, 0.0),
            LandmarkRecord::Object(landmark) => landmark,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReplayLine {
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    landmarks: Option<Vec<LandmarkRecord>>,
    #[serde(default)]
    iris_pixel_width: Option<f64>,
}

/// Frame source reading a JSON-lines recording
pub struct ReplaySource {
    reader: Box<dyn BufRead + Send>,
    label: String,
    detector: DetectorConfig,
    default_size: (u32, u32),
    line_number: usize,
    frame_index: u64,
}

impl ReplaySource {
    /// Open a recording on disk
    pub fn open<P: AsRef<Path>>(path: P, config: &AppConfig) -> Result<Self, FrameError> {
        let file = File::open(path.as_ref()).map_err(|err| FrameError::SourceRead {
            details: format!("{}: {}", path.as_ref().display(), err),
        })?;
        Ok(Self::from_reader(
            BufReader::new(file),
            path.as_ref().display().to_string(),
            config,
        ))
    }

    /// Replay from any buffered reader (in-memory recordings, stdin)
    pub fn from_reader<R: BufRead + Send + 'static>(
        reader: R,
        label: impl Into<String>,
        config: &AppConfig,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            label: label.into(),
            detector: config.detector.clone(),
            default_size: (config.camera.frame_width, config.camera.frame_height),
            line_number: 0,
            frame_index: 0,
        }
    }

    /// Number of frames produced so far
    pub fn frames_read(&self) -> u64 {
        self.frame_index
    }

    fn observation_from(&self, line: ReplayLine) -> FrameObservation {
        let frame_width = line.width.unwrap_or(self.default_size.0);
        let frame_height = line.height.unwrap_or(self.default_size.1);

        let landmarks = match (line.landmarks, line.iris_pixel_width) {
            (Some(records), _) => Some(FaceLandmarks::new(
                records.into_iter().map(Landmark::from).collect(),
            )),
            (None, Some(pixel_width)) => Some(landmarks_for_width(
                pixel_width,
                frame_width,
                frame_height,
                &self.detector,
            )),
            (None, None) => None,
        };

        FrameObservation {
            frame_index: self.frame_index,
            frame_width,
            frame_height,
            landmarks,
        }
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<FrameObservation>, FrameError> {
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.reader.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let trimmed = buf.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let line: ReplayLine =
                serde_json::from_str(trimmed).map_err(|err| FrameError::SourceRead {
                    details: format!("{} line {}: {}", self.label, self.line_number, err),
                })?;

            let observation = self.observation_from(line);
            self.frame_index += 1;
            return Ok(Some(observation));
        }
    }

    fn describe(&self) -> String {
        format!("replay:{}", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::IrisExtractor;
    use std::io::Cursor;

    fn source(text: &str) -> ReplaySource {
        ReplaySource::from_reader(
            Cursor::new(text.to_string()),
            "memory",
            &AppConfig::default(),
        )
    }

    #[test]
    fn test_width_lines_synthesize_landmarks() {
        let mut src = source("{\"width\":640,\"height\":480,\"iris_pixel_width\":105.0}\n");
        let obs = src.next_frame().unwrap().unwrap();
        assert_eq!(obs.frame_index, 0);
        let landmarks = obs.landmarks.unwrap();
        let m = IrisExtractor::from_config(&DetectorConfig::default())
            .extract(&landmarks, obs.frame_width, obs.frame_height)
            .unwrap();
        assert!((m.pixel_width - 105.0).abs() < 1e-9);
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_landmark_triples_and_no_face_lines() {
        let text = "# recorded session\n\
                    {\"width\":320,\"height\":240,\"landmarks\":[[0.1,0.2,0.0],[0.3,0.4]]}\n\
                    \n\
                    {\"landmarks\":null}\n";
        let mut src = source(text);

        let first = src.next_frame().unwrap().unwrap();
        assert_eq!(first.frame_width, 320);
        let landmarks = first.landmarks.unwrap();
        assert_eq!(landmarks.len(), 2);
        assert_eq!(landmarks.points[1], Landmark::new(0.3, 0.4, 0.0));

        let second = src.next_frame().unwrap().unwrap();
        assert_eq!(second.frame_index, 1);
        assert_eq!(second.frame_width, 640);
        assert!(second.landmarks.is_none());

        assert!(src.next_frame().unwrap().is_none());
        assert_eq!(src.frames_read(), 2);
    }

    #[test]
    fn test_invalid_line_reports_line_number() {
        let mut src = source("{\"iris_pixel_width\":100}\nnot json\n");
        assert!(src.next_frame().unwrap().is_some());
        match src.next_frame().unwrap_err() {
            FrameError::SourceRead { details } => assert!(details.contains("line 2"), "{}", details),
            e => panic!("Expected SourceRead, got {:?}", e),
        }
    }

    #[test]
    fn test_open_missing_file() {
        let result = ReplaySource::open("does/not/exist.jsonl", &AppConfig::default());
        assert!(matches!(result, Err(FrameError::SourceRead { .. })));
    }

    #[test]
    fn test_describe() {
        assert_eq!(source("").describe(), "replay:memory");
    }
}
