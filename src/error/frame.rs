// Frame acquisition and landmark extraction errors

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Frame error code constants
///
/// Error code range: 3001-3003
pub struct FrameErrorCodes {}

impl FrameErrorCodes {
    /// Configured landmark index is outside the detector output
    pub const LANDMARK_INDEX_OUT_OF_RANGE: i32 = 3001;

    /// Frame dimensions are zero
    pub const INVALID_FRAME_SIZE: i32 = 3002;

    /// Source failed to produce a frame
    pub const SOURCE_READ: i32 = 3003;
}

/// Log a frame error with structured context
pub fn log_frame_error(err: &FrameError, context: &str) {
    error!(
        "Frame error in {}: code={}, component=FrameSource, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while acquiring frames or extracting iris measurements
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    /// Landmark index not present in the detector output
    LandmarkIndexOutOfRange { index: usize, len: usize },

    /// Frame has a zero dimension
    InvalidFrameSize { width: u32, height: u32 },

    /// Source failed while reading or decoding a frame
    SourceRead { details: String },
}

impl ErrorCode for FrameError {
    fn code(&self) -> i32 {
        match self {
            FrameError::LandmarkIndexOutOfRange { .. } => {
                FrameErrorCodes::LANDMARK_INDEX_OUT_OF_RANGE
            }
            FrameError::InvalidFrameSize { .. } => FrameErrorCodes::INVALID_FRAME_SIZE,
            FrameError::SourceRead { .. } => FrameErrorCodes::SOURCE_READ,
        }
    }

    fn message(&self) -> String {
        match self {
            FrameError::LandmarkIndexOutOfRange { index, len } => {
                format!(
                    "Landmark index {} out of range (detector returned {} points)",
                    index, len
                )
            }
            FrameError::InvalidFrameSize { width, height } => {
                format!("Invalid frame size {}x{}", width, height)
            }
            FrameError::SourceRead { details } => format!("Failed to read frame: {}", details),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FrameError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for FrameError {}

/// Convert from std::io::Error to FrameError
impl From<std::io::Error> for FrameError {
    fn from(err: std::io::Error) -> Self {
        FrameError::SourceRead {
            details: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FrameError {
    fn from(err: serde_json::Error) -> Self {
        FrameError::SourceRead {
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_error_codes() {
        assert_eq!(
            FrameError::LandmarkIndexOutOfRange { index: 474, len: 468 }.code(),
            3001
        );
        assert_eq!(
            FrameError::InvalidFrameSize {
                width: 0,
                height: 480
            }
            .code(),
            3002
        );
        assert_eq!(
            FrameError::SourceRead {
                details: "eof".to_string()
            }
            .code(),
            3003
        );
    }

    #[test]
    fn test_frame_error_messages() {
        let err = FrameError::LandmarkIndexOutOfRange { index: 474, len: 468 };
        assert!(err.message().contains("474"));
        assert!(err.message().contains("468"));

        let err = FrameError::InvalidFrameSize {
            width: 640,
            height: 0,
        };
        assert_eq!(err.message(), "Invalid frame size 640x0");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing recording");
        let err: FrameError = io.into();
        match err {
            FrameError::SourceRead { details } => assert!(details.contains("missing recording")),
            other => panic!("Expected SourceRead, got {:?}", other),
        }
    }
}
