//! Integration tests for the monitoring pipeline and engine
//!
//! These tests validate the full session lifecycle across the public API:
//! - Synthetic and replayed sources feeding the engine
//! - Report stream subscription
//! - Warning overlay planning for too-close frames
//! - Typed engine errors

use std::io::Cursor;

use eye_distance_monitor::analysis::DistanceMonitor;
use eye_distance_monitor::engine::EngineHandle;
use eye_distance_monitor::error::{EngineError, ErrorCode};
use eye_distance_monitor::overlay::{OverlayCommand, OverlayPlan};
use eye_distance_monitor::source::{
    FrameSource, ReplaySource, SyntheticPattern, SyntheticSource, SyntheticSpec,
};
use eye_distance_monitor::{AppConfig, DistanceStatus, FrameReport};

fn init_test_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build test runtime")
}

#[test]
fn test_engine_streams_reports_to_async_subscriber() {
    let config = AppConfig::default();
    let engine = EngineHandle::new(config.clone());
    let mut rx = engine.subscribe();

    engine
        .start(SyntheticSource::new(
            SyntheticSpec::new(SyntheticPattern::Retreat, 80),
            &config,
        ))
        .expect("engine start");

    let rt = init_test_runtime();
    let statuses = rt.block_on(async {
        let mut statuses = Vec::new();
        while statuses.len() < 80 {
            let report = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
                .await
                .expect("report within timeout")
                .expect("report channel open");
            statuses.push(report.status());
        }
        statuses
    });

    let summary = engine.wait().expect("engine wait");
    assert_eq!(summary.frames, 80);

    // Retreat starts too close after calibration and ends safe
    assert_eq!(statuses[30], Some(DistanceStatus::TooClose));
    assert_eq!(statuses[79], Some(DistanceStatus::Safe));
    assert!(statuses[..30].iter().all(Option::is_none));
}

#[test]
fn test_engine_error_codes() {
    let engine = EngineHandle::new(AppConfig::default());
    let err = engine.stop().unwrap_err();
    assert_eq!(err, EngineError::NotRunning);
    assert_eq!(err.code(), 5002);
    assert!(err.to_string().contains("not running"));
}

#[test]
fn test_replay_through_monitor_and_overlay() {
    let config = AppConfig::default();
    let mut recording = String::new();
    for _ in 0..30 {
        recording.push_str("{\"iris_pixel_width\":63.0}\n");
    }
    recording.push_str("{\"iris_pixel_width\":94.5}\n");

    let mut source = ReplaySource::from_reader(Cursor::new(recording), "inline", &config);
    let mut monitor = DistanceMonitor::new(&config);
    let mut last = None;
    while let Some(observation) = source.next_frame().expect("replay line") {
        last = Some(monitor.process(&observation));
    }

    let report = last.expect("at least one report");
    match &report {
        FrameReport::Distance { distance_cm, .. } => {
            // 6.3 * 600 / 94.5 = 40 cm
            assert!((distance_cm.unwrap() - 40.0).abs() < 1e-6);
        }
        other => panic!("Expected Distance, got {:?}", other),
    }

    let plan = OverlayPlan::for_report(&report, &config.overlay);
    assert!(plan.blurs_frame());
    assert!(plan.commands.iter().any(|command| matches!(
        command,
        OverlayCommand::Text { content, .. } if content == "TOO CLOSE!"
    )));
}
