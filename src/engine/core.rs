//! EngineHandle: threaded frame pipeline around the distance monitor.
//!
//! A producer thread pulls observations from a [`FrameSource`] and pushes
//! them into a lock-free SPSC ring. A monitor thread pops them, runs the
//! [`DistanceMonitor`], and publishes each [`FrameReport`] on a broadcast
//! channel plus the telemetry hub. The monitor drains whatever is queued
//! before exiting, so a stopped or exhausted session is never truncated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rtrb::{Consumer, PopError, Producer, PushError, RingBuffer};
use tokio::sync::broadcast;

use crate::analysis::{DistanceMonitor, FrameObservation, FrameReport, MonitorSummary};
use crate::config::AppConfig;
use crate::error::{log_engine_error, log_frame_error, EngineError, ErrorCode};
use crate::source::FrameSource;
use crate::telemetry::{self, DiagnosticError};

/// Capacity of the observation ring between producer and monitor
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Capacity of the report broadcast channel
pub const REPORT_CHANNEL_CAPACITY: usize = 256;

const IDLE_BACKOFF: Duration = Duration::from_millis(1);

struct Workers {
    producer: JoinHandle<()>,
    monitor: JoinHandle<MonitorSummary>,
}

/// EngineHandle owns the worker threads and the report channel.
pub struct EngineHandle {
    config: AppConfig,
    queue_capacity: usize,
    report_tx: broadcast::Sender<FrameReport>,
    running: Arc<AtomicBool>,
    workers: Mutex<Option<Workers>>,
}

impl EngineHandle {
    /// Create an idle engine for the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self::with_queue_capacity(config, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_queue_capacity(config: AppConfig, queue_capacity: usize) -> Self {
        let (report_tx, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        Self {
            config,
            queue_capacity: queue_capacity.max(1),
            report_tx,
            running: Arc::new(AtomicBool::new(false)),
            workers: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Subscribe to frame reports. Lagging receivers lose the oldest reports.
    pub fn subscribe(&self) -> broadcast::Receiver<FrameReport> {
        self.report_tx.subscribe()
    }

    /// True between `start` and `stop`/`wait`
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn workers(&self) -> MutexGuard<'_, Option<Workers>> {
        self.workers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start monitoring frames from `source` with a fresh, uncalibrated monitor.
    ///
    /// # Errors
    /// * `EngineError::AlreadyRunning` - a session is active; call `stop()` first
    pub fn start<S: FrameSource + 'static>(&self, source: S) -> Result<(), EngineError> {
        let mut workers = self.workers();
        if workers.is_some() {
            let err = EngineError::AlreadyRunning;
            log_engine_error(&err, "start");
            return Err(err);
        }

        let (producer, consumer) = RingBuffer::<FrameObservation>::new(self.queue_capacity);
        let source_done = Arc::new(AtomicBool::new(false));
        self.running.store(true, Ordering::SeqCst);
        telemetry::hub().begin_session();

        log::info!(
            "[EngineHandle] Starting session from {} (queue capacity {})",
            source.describe(),
            self.queue_capacity
        );

        let producer_handle = spawn_producer(
            source,
            producer,
            self.queue_capacity,
            Arc::clone(&self.running),
            Arc::clone(&source_done),
        );
        let monitor_handle = spawn_monitor(
            DistanceMonitor::new(&self.config),
            consumer,
            source_done,
            self.report_tx.clone(),
        );

        *workers = Some(Workers {
            producer: producer_handle,
            monitor: monitor_handle,
        });
        Ok(())
    }

    /// Stop the session early and return its summary.
    ///
    /// Frames already queued are still processed before the monitor exits.
    ///
    /// # Errors
    /// * `EngineError::NotRunning` - no session was started
    /// * `EngineError::WorkerPanicked` - a worker thread panicked
    pub fn stop(&self) -> Result<MonitorSummary, EngineError> {
        let workers = self.take_workers("stop")?;
        self.running.store(false, Ordering::SeqCst);
        self.join(workers)
    }

    /// Block until the source is exhausted and every frame is processed.
    pub fn wait(&self) -> Result<MonitorSummary, EngineError> {
        let workers = self.take_workers("wait")?;
        self.join(workers)
    }

    fn take_workers(&self, context: &str) -> Result<Workers, EngineError> {
        self.workers().take().ok_or_else(|| {
            let err = EngineError::NotRunning;
            log_engine_error(&err, context);
            err
        })
    }

    // Monitor first: a dead monitor leaves the producer spinning on a full
    // ring until `running` is cleared.
    fn join(&self, workers: Workers) -> Result<MonitorSummary, EngineError> {
        let monitor = workers.monitor.join();
        self.running.store(false, Ordering::SeqCst);
        let producer = workers.producer.join();

        let summary = monitor.map_err(|_| {
            let err = EngineError::WorkerPanicked {
                worker: "distance-monitor".to_string(),
            };
            log_engine_error(&err, "join");
            err
        })?;

        if producer.is_err() {
            let err = EngineError::WorkerPanicked {
                worker: "frame-producer".to_string(),
            };
            log_engine_error(&err, "join");
            return Err(err);
        }

        log::info!(
            "[EngineHandle] Session finished: {} frames, {} warnings",
            summary.frames,
            summary.warning_frames
        );
        Ok(summary)
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        if let Some(workers) = self.workers().take() {
            self.running.store(false, Ordering::SeqCst);
            let _ = workers.monitor.join();
            let _ = workers.producer.join();
        }
    }
}

fn spawn_producer<S: FrameSource + 'static>(
    mut source: S,
    mut producer: Producer<FrameObservation>,
    capacity: usize,
    running: Arc<AtomicBool>,
    source_done: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let _span = tracing::info_span!("frame_producer").entered();

        'frames: while running.load(Ordering::SeqCst) {
            let mut observation = match source.next_frame() {
                Ok(Some(observation)) => observation,
                Ok(None) => {
                    tracing::info!("[FrameProducer] Source exhausted: {}", source.describe());
                    break;
                }
                Err(err) => {
                    log_frame_error(&err, "frame producer");
                    telemetry::hub().record_error(DiagnosticError::SourceRead, err.message());
                    break;
                }
            };

            // Back off while the ring is full instead of dropping frames
            let mut stalled = false;
            loop {
                match producer.push(observation) {
                    Ok(()) => break,
                    Err(PushError::Full(rejected)) => {
                        if !running.load(Ordering::SeqCst) {
                            break 'frames;
                        }
                        if !stalled {
                            telemetry::hub().record_error(
                                DiagnosticError::QueueBackpressure,
                                "frame ring full",
                            );
                            stalled = true;
                        }
                        observation = rejected;
                        thread::sleep(IDLE_BACKOFF);
                    }
                }
            }

            let occupancy = (capacity - producer.slots()) as f32 / capacity as f32 * 100.0;
            telemetry::hub().record_queue_occupancy("frame_ring", occupancy);
        }

        source_done.store(true, Ordering::SeqCst);
    })
}

fn spawn_monitor(
    mut monitor: DistanceMonitor,
    mut consumer: Consumer<FrameObservation>,
    source_done: Arc<AtomicBool>,
    report_tx: broadcast::Sender<FrameReport>,
) -> JoinHandle<MonitorSummary> {
    thread::spawn(move || {
        let _span = tracing::info_span!("distance_monitor").entered();
        tracing::info!("[MonitorThread] Starting monitor loop");

        loop {
            let observation = match consumer.pop() {
                Ok(observation) => observation,
                Err(PopError::Empty) => {
                    // Exit only once the producer is gone and the ring is drained
                    if source_done.load(Ordering::SeqCst) && consumer.is_empty() {
                        tracing::info!("[MonitorThread] Source done and queue empty, exiting");
                        break;
                    }
                    thread::sleep(IDLE_BACKOFF);
                    continue;
                }
            };

            let started = Instant::now();
            let report = monitor.process(&observation);
            telemetry::hub().record_frame_latency(started.elapsed().as_secs_f32() * 1000.0);
            telemetry::hub().record_report(&report);

            // No subscribers is fine
            let _ = report_tx.send(report);
        }

        monitor.into_summary()
    })
}
