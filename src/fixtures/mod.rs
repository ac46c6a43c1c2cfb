//! Fixture utilities for the deterministic CLI harness.
//!
//! This module discovers recorded sessions (`*.jsonl`), replays them into
//! frame observations, parses optional expectation JSON, and runs the
//! distance monitor over them. It is desktop-focused to support CI and QA
//! workflows without a camera.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::analysis::{DistanceMonitor, FrameObservation, FrameReport, MonitorSummary};
use crate::config::AppConfig;
use crate::source::{FrameSource, ReplaySource};

/// Default location for fixture recordings and expectations.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

const RECORDING_EXTENSION: &str = "jsonl";

/// Metadata describing an available fixture.
#[derive(Clone, Debug)]
pub struct FixtureMetadata {
    pub name: String,
    pub recording_path: PathBuf,
    pub expect_path: Option<PathBuf>,
}

/// Loaded fixture data with replayed observations.
pub struct FixtureData {
    pub metadata: FixtureMetadata,
    pub observations: Vec<FrameObservation>,
    pub expectations: Option<FixtureExpectations>,
}

/// JSON expectation schema for fixture verification.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureExpectations {
    pub fixture: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Frame index expected to complete calibration
    #[serde(default)]
    pub calibrated_after: Option<u64>,
    #[serde(default)]
    pub focal_length: Option<f64>,
    /// Allowed focal length deviation in pixels
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default)]
    pub statuses: Vec<ExpectedStatus>,
    #[serde(default)]
    pub distances: Vec<ExpectedDistance>,
}

/// Expected report label (`no_face`, `calibrating`, `safe`, `too_close`, ...) at a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectedStatus {
    pub frame: u64,
    pub status: String,
}

/// Expected distance estimate at a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectedDistance {
    pub frame: u64,
    pub distance_cm: f64,
    #[serde(default = "default_distance_tolerance")]
    pub tolerance_cm: f64,
}

fn default_tolerance() -> f64 {
    1.0
}

fn default_distance_tolerance() -> f64 {
    0.5
}

impl FixtureExpectations {
    pub fn verify(&self, actual: &[FrameReport]) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();
        let report_at = |frame: u64| actual.iter().find(|r| r.frame_index() == frame);

        if let Some(expected_frame) = self.calibrated_after {
            let completed = actual.iter().find_map(|report| match report {
                FrameReport::CalibrationComplete { frame_index, .. } => Some(*frame_index),
                _ => None,
            });
            if completed != Some(expected_frame) {
                failures.push(ExpectationFailure {
                    check: "calibrated_after",
                    frame: Some(expected_frame),
                    expected: json!(expected_frame),
                    actual: json!(completed),
                });
            }
        }

        if let Some(expected_focal) = self.focal_length {
            let focal = actual.iter().find_map(|report| match report {
                FrameReport::CalibrationComplete { focal_length, .. } => Some(*focal_length),
                _ => None,
            });
            let within = focal
                .map(|f| (f - expected_focal).abs() <= self.tolerance)
                .unwrap_or(false);
            if !within {
                failures.push(ExpectationFailure {
                    check: "focal_length",
                    frame: None,
                    expected: json!({ "focal_length": expected_focal, "tolerance": self.tolerance }),
                    actual: json!(focal),
                });
            }
        }

        for expected in &self.statuses {
            let label = report_at(expected.frame).map(FrameReport::label);
            if label != Some(expected.status.as_str()) {
                failures.push(ExpectationFailure {
                    check: "status",
                    frame: Some(expected.frame),
                    expected: json!(expected.status),
                    actual: json!(label),
                });
            }
        }

        for expected in &self.distances {
            let distance = report_at(expected.frame).and_then(|report| match report {
                FrameReport::Distance { distance_cm, .. } => *distance_cm,
                _ => None,
            });
            let within = distance
                .map(|d| (d - expected.distance_cm).abs() <= expected.tolerance_cm)
                .unwrap_or(false);
            if !within {
                failures.push(ExpectationFailure {
                    check: "distance",
                    frame: Some(expected.frame),
                    expected: json!({
                        "distance_cm": expected.distance_cm,
                        "tolerance_cm": expected.tolerance_cm,
                    }),
                    actual: json!(distance),
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

/// Outcome of comparing actual results with expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> Value {
        json!({
            "failures": self.failures.iter().map(|failure| {
                json!({
                    "check": failure.check,
                    "frame": failure.frame,
                    "expected": failure.expected,
                    "actual": failure.actual,
                })
            }).collect::<Vec<_>>()
        })
    }
}

/// Detailed diff entry for a single failure.
#[derive(Debug)]
pub struct ExpectationFailure {
    pub check: &'static str,
    pub frame: Option<u64>,
    pub expected: Value,
    pub actual: Value,
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all fixtures by their metadata.
    pub fn discover(&self) -> Result<Vec<FixtureMetadata>> {
        let mut fixtures = Vec::new();
        if !self.root.exists() {
            return Ok(fixtures);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) == Some(RECORDING_EXTENSION) {
                    fixtures.push(self.metadata_for_path(&path)?);
                }
            }
        }

        fixtures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fixtures)
    }

    /// Load fixture observations + expectations for provided name or path.
    pub fn load(
        &self,
        fixture: &str,
        override_expect: Option<PathBuf>,
        config: &AppConfig,
    ) -> Result<FixtureData> {
        let recording_path = self.resolve_fixture_path(fixture)?;
        let metadata = self.metadata_for_path(&recording_path)?;
        let observations = read_recording(&recording_path, config)?;

        let expectation_path = override_expect.or(metadata.expect_path.clone());
        let expectations = match expectation_path {
            Some(path) => {
                let json = fs::read_to_string(&path)
                    .with_context(|| format!("reading expectation {}", path.display()))?;
                Some(
                    serde_json::from_str(&json)
                        .with_context(|| format!("parsing {}", path.display()))?,
                )
            }
            None => None,
        };

        Ok(FixtureData {
            metadata,
            observations,
            expectations,
        })
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self.root.join(format!("{fixture}.{RECORDING_EXTENSION}"));
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(anyhow!(
                "Fixture '{fixture}' not found in {}",
                self.root.display()
            ))
        }
    }

    fn metadata_for_path(&self, recording_path: &Path) -> Result<FixtureMetadata> {
        let name = recording_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("Invalid fixture name for {}", recording_path.display()))?
            .to_string();
        let expect_path = recording_path.with_extension("expect.json");
        Ok(FixtureMetadata {
            name,
            recording_path: recording_path.to_path_buf(),
            expect_path: expect_path.exists().then_some(expect_path),
        })
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

fn read_recording(path: &Path, config: &AppConfig) -> Result<Vec<FrameObservation>> {
    let mut source = ReplaySource::open(path, config)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut observations = Vec::new();
    while let Some(observation) = source
        .next_frame()
        .with_context(|| format!("replaying {}", path.display()))?
    {
        observations.push(observation);
    }
    Ok(observations)
}

/// Reports and summary of one fixture run.
#[derive(Debug, Clone, Serialize)]
pub struct FixtureRun {
    pub reports: Vec<FrameReport>,
    pub summary: MonitorSummary,
    pub calibrated: bool,
    pub focal_length: Option<f64>,
}

/// Executes fixtures by feeding replayed observations through the monitor.
pub struct FixtureProcessor {
    config: AppConfig,
}

impl FixtureProcessor {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, data: &FixtureData) -> FixtureRun {
        let mut monitor = DistanceMonitor::new(&self.config);
        let reports: Vec<FrameReport> = data
            .observations
            .iter()
            .map(|observation| monitor.process(observation))
            .collect();

        let calibrated = monitor.estimator().is_calibrated();
        let focal_length = monitor.estimator().focal_length();
        FixtureRun {
            reports,
            summary: monitor.into_summary(),
            calibrated,
            focal_length,
        }
    }
}
