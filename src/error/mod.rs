// Error types for the eye distance monitor
//
// This module defines custom error types for calibration, frame acquisition,
// configuration and engine lifecycle, each carrying a stable numeric code so
// CLI and JSON consumers can react to failures programmatically.

mod calibration;
mod config;
mod engine;
mod frame;

pub use calibration::{log_calibration_error, CalibrationError, CalibrationErrorCodes};
pub use config::{ConfigError, ConfigErrorCodes};
pub use engine::{log_engine_error, EngineError, EngineErrorCodes};
pub use frame::{log_frame_error, FrameError, FrameErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the CLI and telemetry surfaces.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
