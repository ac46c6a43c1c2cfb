// Engine lifecycle errors

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Engine error code constants
///
/// Error code range: 5001-5003
pub struct EngineErrorCodes {}

impl EngineErrorCodes {
    /// Engine is already running
    pub const ALREADY_RUNNING: i32 = 5001;

    /// Engine is not running
    pub const NOT_RUNNING: i32 = 5002;

    /// A worker thread panicked before it could be joined
    pub const WORKER_PANICKED: i32 = 5003;
}

/// Log an engine error with structured context
pub fn log_engine_error(err: &EngineError, context: &str) {
    error!(
        "Engine error in {}: code={}, component=EngineHandle, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors covering the producer/monitor worker lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Engine is already running
    AlreadyRunning,

    /// Engine is not running
    NotRunning,

    /// Worker thread panicked
    WorkerPanicked { worker: String },
}

impl ErrorCode for EngineError {
    fn code(&self) -> i32 {
        match self {
            EngineError::AlreadyRunning => EngineErrorCodes::ALREADY_RUNNING,
            EngineError::NotRunning => EngineErrorCodes::NOT_RUNNING,
            EngineError::WorkerPanicked { .. } => EngineErrorCodes::WORKER_PANICKED,
        }
    }

    fn message(&self) -> String {
        match self {
            EngineError::AlreadyRunning => {
                "Monitor engine already running. Call stop() first.".to_string()
            }
            EngineError::NotRunning => "Monitor engine not running. Call start() first.".to_string(),
            EngineError::WorkerPanicked { worker } => {
                format!("Worker thread '{}' panicked", worker)
            }
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EngineError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_codes() {
        assert_eq!(EngineError::AlreadyRunning.code(), 5001);
        assert_eq!(EngineError::NotRunning.code(), 5002);
        assert_eq!(
            EngineError::WorkerPanicked {
                worker: "monitor".to_string()
            }
            .code(),
            5003
        );
    }

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::WorkerPanicked {
            worker: "producer".to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("EngineError"));
        assert!(display.contains("producer"));
    }
}
