//! Process-wide diagnostics for the monitor pipeline.
//!
//! Engine threads publish [`MetricEvent`]s here. Readers either follow the
//! live stream (`subscribe`) or take a [`TelemetrySnapshot`] of the most
//! recent events. Derived gauges (latency window, ring occupancy, warning
//! state) live behind one lock so related events are emitted consistently.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::analysis::{DistanceStatus, FrameReport};

pub mod events;

pub use events::{DiagnosticError, MetricEvent};

/// Occupancy changes smaller than this many percentage points are not re-published
const QUEUE_GAUGE_STEP: f32 = 2.5;

static HUB: Lazy<TelemetryHub> = Lazy::new(TelemetryHub::default);

/// Shared hub used by the engine workers.
pub fn hub() -> &'static TelemetryHub {
    &HUB
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Recent events plus lifetime counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub events: Vec<MetricEvent>,
    /// Events published since the hub was created
    pub published: u64,
    /// Events pushed out of the bounded history
    pub evicted: u64,
}

struct LatencyWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl LatencyWindow {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, elapsed_ms: f32) -> MetricEvent {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(elapsed_ms.max(0.0));

        let sample_count = self.samples.len();
        let total: f32 = self.samples.iter().sum();
        MetricEvent::FrameLatency {
            avg_ms: total / sample_count as f32,
            max_ms: self.samples.iter().copied().fold(0.0, f32::max),
            sample_count,
        }
    }
}

struct Gauges {
    latency: LatencyWindow,
    queues: HashMap<&'static str, f32>,
    too_close: Option<bool>,
}

/// Broadcast stream plus bounded history of monitor metrics.
pub struct TelemetryHub {
    tx: broadcast::Sender<MetricEvent>,
    history: Mutex<VecDeque<MetricEvent>>,
    history_len: usize,
    published: AtomicU64,
    evicted: AtomicU64,
    gauges: Mutex<Gauges>,
}

impl TelemetryHub {
    /// # Arguments
    /// * `channel_capacity` - Broadcast buffer per subscriber
    /// * `history_len` - Events retained for `snapshot`
    /// * `latency_window` - Frames averaged by `FrameLatency` events
    pub fn new(channel_capacity: usize, history_len: usize, latency_window: usize) -> Self {
        let (tx, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_len)),
            history_len: history_len.max(1),
            published: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            gauges: Mutex::new(Gauges {
                latency: LatencyWindow::new(latency_window),
                queues: HashMap::new(),
                too_close: None,
            }),
        }
    }

    /// Forget per-session gauges so the next session reports its first
    /// warning state and starts a fresh latency window. History is kept.
    pub fn begin_session(&self) {
        let mut gauges = lock(&self.gauges);
        gauges.too_close = None;
        gauges.queues.clear();
        gauges.latency.samples.clear();
    }

    pub fn publish(&self, event: MetricEvent) {
        self.published.fetch_add(1, Ordering::Relaxed);
        {
            let mut history = lock(&self.history);
            while history.len() >= self.history_len {
                history.pop_front();
                self.evicted.fetch_add(1, Ordering::Relaxed);
            }
            history.push_back(event.clone());
        }

        // Nobody listening is the normal case
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let events = lock(&self.history).iter().cloned().collect();
        TelemetrySnapshot {
            events,
            published: self.published.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
        }
    }

    /// Publish the metrics derived from one processed frame
    pub fn record_report(&self, report: &FrameReport) {
        match report {
            FrameReport::Calibrating { progress, .. }
            | FrameReport::CalibrationComplete { progress, .. } => {
                self.publish(MetricEvent::Calibration {
                    collected: progress.samples_collected,
                    needed: progress.samples_needed,
                });
            }
            FrameReport::Distance {
                distance_cm: Some(distance_cm),
                status,
                ..
            } => {
                self.publish(MetricEvent::Distance {
                    distance_cm: *distance_cm,
                    safe: *status == DistanceStatus::Safe,
                });

                let too_close = status.is_warning();
                let mut gauges = lock(&self.gauges);
                if gauges.too_close != Some(too_close) {
                    gauges.too_close = Some(too_close);
                    self.publish(MetricEvent::WarningChanged {
                        too_close,
                        timestamp_ms: now_timestamp_ms(),
                    });
                }
            }
            FrameReport::Rejected { reason, .. } => {
                self.record_error(DiagnosticError::RejectedFrame, reason.clone());
            }
            FrameReport::Distance { .. } | FrameReport::NoFace { .. } => {}
        }
    }

    /// Record wall-clock time spent processing one frame
    pub fn record_frame_latency(&self, elapsed_ms: f32) {
        let event = lock(&self.gauges).latency.push(elapsed_ms);
        self.publish(event);
    }

    pub fn record_queue_occupancy(&self, channel: &'static str, percent: f32) {
        let percent = percent.clamp(0.0, 100.0);
        let mut gauges = lock(&self.gauges);
        let changed = match gauges.queues.get(channel) {
            Some(last) => (last - percent).abs() >= QUEUE_GAUGE_STEP,
            None => true,
        };
        if changed {
            gauges.queues.insert(channel, percent);
            self.publish(MetricEvent::QueueOccupancy {
                channel: channel.to_string(),
                percent,
            });
        }
    }

    pub fn record_error(&self, code: DiagnosticError, context: impl Into<String>) {
        self.publish(MetricEvent::Error {
            code,
            context: context.into(),
        });
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(256, 128, 30)
    }
}

fn now_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
