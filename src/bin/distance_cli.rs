use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eye_distance_monitor::analysis::{FrameReport, MonitorSummary};
use eye_distance_monitor::config::AppConfig;
use eye_distance_monitor::engine::EngineHandle;
use eye_distance_monitor::fixtures::{ExpectationDiff, FixtureCatalog, FixtureProcessor};
use eye_distance_monitor::init_logging;
use eye_distance_monitor::overlay::OverlayPlan;
use eye_distance_monitor::source::{SyntheticPattern, SyntheticSource, SyntheticSpec};
use eye_distance_monitor::telemetry;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser, Debug)]
#[command(
    name = "distance_cli",
    about = "Deterministic replay and simulation harness for the eye distance monitor"
)]
struct Cli {
    /// Override directory containing fixture recordings (defaults to ./fixtures)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a recorded fixture and optionally compare against expectations
    Replay {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        expect: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Stream frame reports for a synthetic session to stdout
    Simulate {
        #[arg(long, default_value = "approach")]
        pattern: SyntheticPattern,
        #[arg(long, default_value_t = 90)]
        frames: u64,
        #[arg(long)]
        seed: Option<u64>,
        /// Peak width jitter in pixels
        #[arg(long, default_value_t = 0.0)]
        jitter: f64,
        /// Include the overlay drawing plan with each report
        #[arg(long)]
        overlay: bool,
        /// Print a telemetry snapshot after the summary
        #[arg(long)]
        telemetry: bool,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List available fixtures on disk
    DumpFixtures,
    /// Print the effective configuration as JSON
    ShowConfig {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_default();

    match cli.command {
        Commands::Replay {
            fixture,
            expect,
            output,
            config,
        } => run_replay(&catalog, &fixture, expect, output, load_config(config)?),
        Commands::Simulate {
            pattern,
            frames,
            seed,
            jitter,
            overlay,
            telemetry,
            config,
        } => {
            let mut spec = SyntheticSpec::new(pattern, frames);
            spec.jitter_px = jitter;
            if let Some(seed) = seed {
                spec.seed = seed;
            }
            run_simulate(spec, overlay, telemetry, load_config(config)?)
        }
        Commands::DumpFixtures => run_dump(&catalog),
        Commands::ShowConfig { config } => {
            let config = load_config(config)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::from(0))
        }
    }
}

/// Explicit paths must parse; without one the default location is tried
/// and missing files fall back to defaults.
fn load_config(path: Option<PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => {
            let json = fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?
        }
        None => AppConfig::load(),
    };
    config.validate().context("validating configuration")?;
    Ok(config)
}

fn run_replay(
    catalog: &FixtureCatalog,
    fixture: &str,
    override_expect: Option<PathBuf>,
    output_path: Option<PathBuf>,
    config: AppConfig,
) -> Result<ExitCode> {
    let data = catalog
        .load(fixture, override_expect, &config)
        .with_context(|| format!("loading fixture {}", fixture))?;
    let run = FixtureProcessor::new(config).run(&data);

    let report = ReplayReportPayload {
        fixture: &data.metadata.name,
        frame_count: run.reports.len(),
        calibrated: run.calibrated,
        focal_length: run.focal_length,
        summary: &run.summary,
        reports: &run.reports,
    };
    let json = serde_json::to_string_pretty(&report)?;
    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    if let Some(expectations) = data.expectations {
        match expectations.verify(&run.reports) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        }
    } else {
        Ok(ExitCode::from(0))
    }
}

fn run_simulate(
    spec: SyntheticSpec,
    with_overlay: bool,
    with_telemetry: bool,
    config: AppConfig,
) -> Result<ExitCode> {
    let expected_frames = spec.frames;
    let overlay_style = config.overlay;
    let source = SyntheticSource::new(spec, &config);
    let engine = EngineHandle::new(config);
    let mut reports = engine.subscribe();

    engine.start(source)?;

    // Current-thread runtime just for draining the broadcast channel
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building report runtime")?;
    runtime.block_on(async {
        let mut seen = 0u64;
        while seen < expected_frames {
            match reports.recv().await {
                Ok(report) => {
                    seen += 1;
                    let overlay =
                        with_overlay.then(|| OverlayPlan::for_report(&report, &overlay_style));
                    print_report(&report, overlay)?;
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("[distance_cli] Report stream lagged, skipped {}", skipped);
                    seen += skipped;
                }
                Err(RecvError::Closed) => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    })?;

    let summary = engine.wait()?;
    print_summary(&summary)?;
    if with_telemetry {
        println!(
            "{}",
            serde_json::to_string(&serde_json::json!({ "telemetry": telemetry::hub().snapshot() }))?
        );
    }
    Ok(ExitCode::from(0))
}

fn print_report(report: &FrameReport, overlay: Option<OverlayPlan>) -> Result<()> {
    match overlay {
        Some(plan) => println!(
            "{}",
            serde_json::to_string(&serde_json::json!({ "report": report, "overlay": plan }))?
        ),
        None => println!("{}", serde_json::to_string(report)?),
    }
    Ok(())
}

fn print_summary(summary: &MonitorSummary) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string(&serde_json::json!({ "summary": summary }))?
    );
    Ok(())
}

fn run_dump(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in fixtures {
        if let Some(expect) = metadata.expect_path {
            println!("{} -> {}", metadata.name, expect.display());
        } else {
            println!("{}", metadata.name);
        }
    }
    Ok(ExitCode::from(0))
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct ReplayReportPayload<'a> {
    fixture: &'a str,
    frame_count: usize,
    calibrated: bool,
    focal_length: Option<f64>,
    summary: &'a MonitorSummary,
    #[serde(skip_serializing_if = "slice_empty")]
    reports: &'a [FrameReport],
}

fn slice_empty(reports: &&[FrameReport]) -> bool {
    reports.is_empty()
}
