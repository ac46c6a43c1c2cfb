use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_distance_cli"));
    command.current_dir(env!("CARGO_MANIFEST_DIR"));
    command
}

fn fixture_file(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

#[test]
fn replay_fixture_succeeds() {
    let output = cli()
        .args(["replay", "--fixture", "steady_60cm"])
        .output()
        .expect("failed to run distance_cli replay");
    assert!(
        output.status.success(),
        "CLI exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("replay report JSON payload");
    assert_eq!(json["fixture"], "steady_60cm");
    assert_eq!(json["frame_count"], 40);
    assert_eq!(json["calibrated"], true);
    let focal = json["focal_length"].as_f64().expect("focal length");
    assert!((focal - 600.0).abs() < 1e-6, "focal {focal}");
    assert_eq!(json["summary"]["warning_frames"], 0);
    assert_eq!(json["reports"][39]["kind"], "distance");
    assert_eq!(json["reports"][39]["status"], "safe");
}

#[test]
fn replay_lean_in_matches_expectations() {
    let output = cli()
        .args(["replay", "--fixture", "lean_in"])
        .output()
        .expect("failed to run distance_cli replay");
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: Value = serde_json::from_slice(&output.stdout).expect("replay report JSON");
    assert_eq!(json["summary"]["warning_frames"], 2);
    assert_eq!(json["summary"]["rejected"], 1);
}

#[test]
fn replay_fixture_detects_mismatch() {
    let output = cli()
        .args([
            "replay",
            "--fixture",
            "lean_in",
            "--expect",
            &fixture_file("lean_in.wrong.json"),
        ])
        .output()
        .expect("failed to run mismatch replay");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(
        stderr.contains("\"failures\""),
        "expected diff JSON in stderr, got {stderr}"
    );
    assert!(stderr.contains("too_close"), "{stderr}");
}

#[test]
fn replay_writes_output_file() {
    let path = std::env::temp_dir().join(format!("distance-cli-report-{}.json", std::process::id()));
    let output = cli()
        .args([
            "replay",
            "--fixture",
            "steady_60cm",
            "--output",
            &path.to_string_lossy(),
        ])
        .output()
        .expect("failed to run replay with output");
    assert!(output.status.success());

    let written = std::fs::read_to_string(&path).expect("report file written");
    let json: Value = serde_json::from_str(&written).expect("report JSON");
    assert_eq!(json["frame_count"], 40);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn replay_unknown_fixture_fails() {
    let output = cli()
        .args(["replay", "--fixture", "no_such_session"])
        .output()
        .expect("failed to run replay");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("Error:"), "{stderr}");
}

#[test]
fn simulate_streams_reports_and_summary() {
    let output = cli()
        .args(["simulate", "--pattern", "approach", "--frames", "60", "--seed", "7"])
        .output()
        .expect("failed to run simulate");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let lines: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("JSON line"))
        .collect();
    assert_eq!(lines.len(), 61, "60 reports plus summary");
    assert_eq!(lines[0]["kind"], "calibrating");
    assert_eq!(lines[59]["status"], "too_close");
    assert_eq!(lines[60]["summary"]["frames"], 60);
}

#[test]
fn simulate_with_overlay_includes_draw_commands() {
    let output = cli()
        .args(["simulate", "--pattern", "steady", "--frames", "31", "--overlay"])
        .output()
        .expect("failed to run simulate --overlay");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let last_report: Value =
        serde_json::from_str(stdout.lines().nth(30).expect("31st line")).expect("JSON line");
    assert_eq!(last_report["report"]["status"], "safe");
    let commands = last_report["overlay"]["commands"]
        .as_array()
        .expect("overlay commands");
    assert_eq!(commands[0]["op"], "text");
    assert_eq!(commands[0]["content"], "Distance: 60.0 cm");
}

#[test]
fn simulate_with_telemetry_appends_snapshot() {
    let output = cli()
        .args(["simulate", "--pattern", "retreat", "--frames", "40", "--telemetry"])
        .output()
        .expect("failed to run simulate --telemetry");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let last: Value =
        serde_json::from_str(stdout.lines().last().expect("telemetry line")).expect("JSON line");
    let events = last["telemetry"]["events"]
        .as_array()
        .expect("telemetry events");
    assert!(last["telemetry"]["published"].as_u64().unwrap_or(0) > 0);
    assert!(events
        .iter()
        .any(|event| event["type"] == "warning_changed" && event["payload"]["too_close"] == true));
}

#[test]
fn dump_fixtures_lists_assets() {
    let output = cli()
        .arg("dump-fixtures")
        .output()
        .expect("failed to run dump-fixtures");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    assert!(
        stdout.contains("steady_60cm") && stdout.contains("lean_in"),
        "expected fixture listing, got {stdout}"
    );
}

#[test]
fn show_config_prints_defaults() {
    let output = cli()
        .arg("show-config")
        .output()
        .expect("failed to run show-config");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("config JSON");
    assert_eq!(json["calibration"]["target_frames"], 30);
    assert_eq!(json["warning"]["safety_threshold_cm"], 50.0);
}

#[test]
fn show_config_rejects_invalid_file() {
    let path = std::env::temp_dir().join(format!("distance-cli-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"calibration":{"target_frames":0}}"#).unwrap();
    let output = cli()
        .args(["show-config", "--config", &path.to_string_lossy()])
        .output()
        .expect("failed to run show-config");
    assert_eq!(output.status.code(), Some(1));
    let _ = std::fs::remove_file(&path);
}
