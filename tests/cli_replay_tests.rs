// End-to-end replay through the spikewatch binary
//
// Every run uses --no-delay and a fixed --seed so the stream is fast and
// reproducible.

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn spikewatch() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("spikewatch");
    cmd.arg("--no-delay").arg("--seed").arg("42");
    cmd
}

fn json_report(args: &[&str]) -> serde_json::Value {
    let output = spikewatch()
        .args(args)
        .arg("--format")
        .arg("json")
        .output()
        .expect("Failed to run spikewatch");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}

// ============================================================================
// Text output
// ============================================================================

#[test]
fn test_text_summary_on_stdout() {
    spikewatch()
        .arg("--points")
        .arg("50")
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Stock Price Anomaly Detection ==="))
        .stdout(predicate::str::contains("Detection method: Z-score"))
        .stdout(predicate::str::contains("Data Points:      50"));
}

#[test]
fn test_realtime_alerts_on_stderr() {
    // A very low threshold guarantees flagged samples
    spikewatch()
        .arg("--points")
        .arg("80")
        .arg("--threshold")
        .arg("0.1")
        .assert()
        .success()
        .stderr(predicate::str::contains("⚠️  ANOMALY"))
        .stdout(predicate::str::contains("Flagged samples in window:"));
}

#[test]
fn test_warmup_suppresses_alerts() {
    // Detection never runs while the window holds <= warmup samples
    spikewatch()
        .arg("--points")
        .arg("20")
        .arg("--warmup")
        .arg("20")
        .arg("--threshold")
        .arg("0.1")
        .assert()
        .success()
        .stderr(predicate::str::contains("ANOMALY").not())
        .stdout(predicate::str::contains("Anomalies:        0"));
}

#[test]
fn test_temperature_generator_label() {
    spikewatch()
        .arg("--generator")
        .arg("temperature")
        .arg("--method")
        .arg("grubbs")
        .arg("--points")
        .arg("30")
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Temperature Readings Anomaly Detection ==="))
        .stdout(predicate::str::contains("Detection method: Grubbs' Test"));
}

// ============================================================================
// Machine-readable output
// ============================================================================

#[test]
fn test_json_output_structure() {
    let report = json_report(&["--points", "60", "--method", "iqr"]);

    assert_eq!(report["format"], "spikewatch-json-v1");
    assert_eq!(report["detector"]["method"], "InterQuartile Range");
    assert_eq!(report["detector"]["multiplier"], 1.5);
    assert_eq!(report["generator"]["kind"], "stock-price");
    assert_eq!(report["capacity"], 200);
    assert_eq!(report["warmup"], 10);

    let samples = report["samples"].as_array().unwrap();
    assert_eq!(samples.len(), 60);
    assert_eq!(samples[0]["index"], 1);
    assert_eq!(samples[59]["index"], 60);

    // The window is below capacity, so every verdict is still retained
    let flagged = samples
        .iter()
        .filter(|s| s["is_anomaly"].as_bool().unwrap())
        .count() as u64;
    assert_eq!(report["summary"]["data_points"], 60);
    assert_eq!(report["summary"]["anomaly_count"].as_u64().unwrap(), flagged);

    // No verdict before the warmup is exceeded
    assert!(samples[..10]
        .iter()
        .all(|s| !s["is_anomaly"].as_bool().unwrap()));
}

#[test]
fn test_json_window_is_bounded_by_capacity() {
    let report = json_report(&["--points", "120", "--capacity", "50"]);
    let samples = report["samples"].as_array().unwrap();
    assert_eq!(samples.len(), 50);
    assert_eq!(samples[0]["index"], 71);
    assert_eq!(report["summary"]["data_points"], 120);
}

#[test]
fn test_seed_makes_runs_reproducible() {
    let first = json_report(&["--points", "40"]);
    let second = json_report(&["--points", "40"]);

    let values = |report: &serde_json::Value| -> Vec<f64> {
        report["samples"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["value"].as_f64().unwrap())
            .collect()
    };
    assert_eq!(values(&first), values(&second));
}

#[test]
fn test_csv_output() {
    let output = spikewatch()
        .arg("--points")
        .arg("25")
        .arg("--format")
        .arg("csv")
        .output()
        .expect("Failed to run spikewatch");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let mut lines = stdout.lines();
    assert_eq!(
        lines.next(),
        Some("index,timestamp_ms,value,is_anomaly,score")
    );
    assert_eq!(lines.count(), 25);
}

#[test]
fn test_html_report_written() {
    let tmp_dir = TempDir::new().unwrap();
    let report = tmp_dir.path().join("report.html");

    spikewatch()
        .arg("--points")
        .arg("40")
        .arg("--method")
        .arg("rolling")
        .arg("--window")
        .arg("10")
        .arg("--html")
        .arg(&report)
        .assert()
        .success();

    let html = fs::read_to_string(&report).unwrap();
    assert!(html.contains("<h1>Stock Price Anomaly Detection</h1>"));
    assert!(html.contains("Rolling Z-score"));
    assert!(html.contains("<svg"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_file_selects_detector() {
    let tmp_dir = TempDir::new().unwrap();
    let config = tmp_dir.path().join("spikewatch.toml");
    fs::write(
        &config,
        r#"
[detector]
method = "Grubbs' Test"
alpha = 0.01

[generator]
kind = "temperature"

[stream]
points = 35
"#,
    )
    .unwrap();

    let report = json_report(&["--config", config.to_str().unwrap()]);
    assert_eq!(report["detector"]["method"], "Grubbs' Test");
    assert_eq!(report["detector"]["alpha"], 0.01);
    assert_eq!(report["generator"]["kind"], "temperature");
    assert_eq!(report["summary"]["data_points"], 35);
}

#[test]
fn test_cli_overrides_config_file() {
    let tmp_dir = TempDir::new().unwrap();
    let config = tmp_dir.path().join("spikewatch.toml");
    fs::write(&config, "[stream]\npoints = 35\n").unwrap();

    let report = json_report(&["--config", config.to_str().unwrap(), "--points", "12"]);
    assert_eq!(report["summary"]["data_points"], 12);
}

// ============================================================================
// Error handling
// ============================================================================

#[test]
fn test_unknown_method_in_config_fails() {
    let tmp_dir = TempDir::new().unwrap();
    let config = tmp_dir.path().join("spikewatch.toml");
    fs::write(&config, "[detector]\nmethod = \"DBSCAN\"\n").unwrap();

    spikewatch()
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown detection method: DBSCAN"));
}

#[test]
fn test_missing_config_file_fails() {
    spikewatch()
        .arg("--config")
        .arg("/nonexistent/spikewatch.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_invalid_parameter_fails() {
    spikewatch()
        .arg("--method")
        .arg("grubbs")
        .arg("--alpha")
        .arg("2")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value for alpha"));
}

#[test]
fn test_speed_out_of_range_rejected() {
    spikewatch()
        .arg("--speed")
        .arg("0")
        .assert()
        .failure();
}
