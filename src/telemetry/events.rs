//! Core telemetry event types describing monitor diagnostics exposed to
//! the CLI and engine subscribers.

use serde::{Deserialize, Serialize};

/// Diagnostic error codes surfaced via telemetry metrics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticError {
    SourceRead,
    RejectedFrame,
    QueueBackpressure,
    Unknown,
}

/// Metric events covering frame latency, calibration, distance and warnings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    FrameLatency {
        avg_ms: f32,
        max_ms: f32,
        sample_count: usize,
    },
    QueueOccupancy {
        channel: String,
        percent: f32,
    },
    Calibration {
        collected: u32,
        needed: u32,
    },
    Distance {
        distance_cm: f64,
        safe: bool,
    },
    /// Emitted only when the too-close state flips
    WarningChanged {
        too_close: bool,
        timestamp_ms: u64,
    },
    Error {
        code: DiagnosticError,
        context: String,
    },
}
