//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// Build command for the channelboard binary.
fn channelboard_cli() -> Command {
    cargo_bin_cmd!("channelboard")
}

/// Path to the library's test fixtures (relative to workspace).
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("channelboard")
        .join("tests")
        .join("fixtures")
}

#[test]
fn test_cli_help() {
    let mut cmd = channelboard_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("channel"));
}

#[test]
fn test_cli_version() {
    let mut cmd = channelboard_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_generate_human() {
    let mut cmd = channelboard_cli();
    let path = fixtures_dir().join("blinky_request.json");

    cmd.arg("generate").arg(path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Compact"))
        .stdout(predicate::str::contains("Signal-Flow"));
}

#[test]
fn test_cli_generate_json_top() {
    let mut cmd = channelboard_cli();
    let path = fixtures_dir().join("blinky_request.json");

    let output = cmd
        .arg("generate")
        .arg(path)
        .arg("--format")
        .arg("json")
        .arg("--top")
        .arg("2")
        .output()
        .expect("Should run");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("Should print JSON");
    assert_eq!(json["arrangements"].as_array().map(|a| a.len()), Some(2));
}

#[test]
fn test_cli_generate_then_check_saved_design() {
    let dir = TempDir::new().unwrap();
    let saved = dir.path().join("design.json");

    channelboard_cli()
        .arg("generate")
        .arg(fixtures_dir().join("blinky_request.json"))
        .arg("--save")
        .arg(&saved)
        .assert()
        .success();
    assert!(saved.exists());

    channelboard_cli()
        .arg("check")
        .arg(&saved)
        .assert()
        .success()
        .stdout(predicate::str::contains("Design:"));
}

#[test]
fn test_cli_generate_invalid_connection() {
    let mut cmd = channelboard_cli();
    let path = fixtures_dir().join("bad_connection_request.json");

    cmd.arg("generate").arg(path);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("dangling"));
}

#[test]
fn test_cli_detect() {
    let mut cmd = channelboard_cli();
    let path = fixtures_dir().join("blinky_request.json");

    cmd.arg("detect").arg(path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("VCC"))
        .stdout(predicate::str::contains("Ground: 6"));
}

/// Request with a solar panel the built-in catalog does not describe.
const SOLAR_REQUEST: &str = r#"{
  "board": {"outline": [{"x": 0, "y": 0}, {"x": 80, "y": 0}, {"x": 80, "y": 50}, {"x": 0, "y": 50}]},
  "components": [
    {"id": "panel", "type": "solar-panel", "quantity": 1},
    {"id": "mcu", "type": "attiny85", "quantity": 1}
  ],
  "connections": []
}"#;

const SOLAR_FOOTPRINTS: &str = r#"[{
  "type": "solar-panel",
  "size": {"width": 30.0, "height": 20.0},
  "pads": [
    {"id": "OUT+", "offset": {"x": -10.0, "y": 0.0}, "size": {"width": 2.5, "height": 2.5}, "role": "vcc"},
    {"id": "OUT-", "offset": {"x": 10.0, "y": 0.0}, "size": {"width": 2.5, "height": 2.5}, "role": "gnd"}
  ]
}]"#;

#[test]
fn test_cli_detect_with_footprint_directory() {
    let dir = TempDir::new().unwrap();
    let request = dir.path().join("request.json");
    std::fs::write(&request, SOLAR_REQUEST).unwrap();
    let library = dir.path().join("footprints");
    std::fs::create_dir(&library).unwrap();
    std::fs::write(library.join("solar.json"), SOLAR_FOOTPRINTS).unwrap();
    std::fs::write(library.join("broken.json"), "{ not json").unwrap();

    let mut cmd = channelboard_cli();
    cmd.arg("--footprints").arg(&library).arg("detect").arg(&request);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("panel/0:OUT+"))
        .stdout(predicate::str::contains("panel/0:OUT-"));

    let mut cmd = channelboard_cli();
    cmd.arg("detect").arg(&request);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("OUT+").not());
}

#[test]
fn test_cli_missing_footprint_directory() {
    let mut cmd = channelboard_cli();
    let path = fixtures_dir().join("blinky_request.json");

    cmd.arg("generate").arg(path).arg("--footprints").arg("no_such_footprints");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("footprint directory"));
}

#[test]
fn test_cli_check_clean_design() {
    let mut cmd = channelboard_cli();
    let path = fixtures_dir().join("clean_design.json");

    cmd.arg("check").arg(path).arg("--fail-on").arg("warning");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No violations found"));
}

#[test]
fn test_cli_check_fail_on_error() {
    let mut cmd = channelboard_cli();
    let path = fixtures_dir().join("spacing_design.json");

    cmd.arg("check").arg(path).arg("--fail-on").arg("error");
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("[spacing]"));
}

#[test]
fn test_cli_check_json_output() {
    let mut cmd = channelboard_cli();
    let path = fixtures_dir().join("overhang_design.json");

    cmd.arg("check").arg(path).arg("--format").arg("json");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"overhang\""))
        .stdout(predicate::str::contains("\"errors\": 1"));
}

#[test]
fn test_cli_check_github_output() {
    let mut cmd = channelboard_cli();
    let path = fixtures_dir().join("spacing_design.json");

    cmd.arg("check").arg(path).arg("--format").arg("github");
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("::error file="));
}

#[test]
fn test_cli_check_with_rules_file() {
    let dir = TempDir::new().unwrap();
    let rules = dir.path().join("rules.json");
    std::fs::write(&rules, "{}").unwrap();

    let mut cmd = channelboard_cli();
    cmd.arg("check")
        .arg(fixtures_dir().join("spacing_design.json"))
        .arg("--rules")
        .arg(&rules)
        .arg("--fail-on")
        .arg("warning");
    cmd.assert().success();
}

#[test]
fn test_cli_check_fix_writes_output() {
    let dir = TempDir::new().unwrap();
    let fixed = dir.path().join("fixed.json");

    let mut cmd = channelboard_cli();
    cmd.arg("check")
        .arg(fixtures_dir().join("overhang_design.json"))
        .arg("--fix")
        .arg("--output")
        .arg(&fixed)
        .arg("--fail-on")
        .arg("error");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No violations found"));

    let content = std::fs::read_to_string(&fixed).unwrap();
    let design: serde_json::Value = serde_json::from_str(&content).unwrap();
    let x = design["components"][0]["position"]["x"].as_f64().unwrap();
    assert!(x > 1.5);
}

#[test]
fn test_cli_check_missing_file() {
    let mut cmd = channelboard_cli();

    cmd.arg("check").arg("no_such_design.json");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_rules() {
    let mut cmd = channelboard_cli();

    cmd.arg("rules").arg("--detail");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("spacing"))
        .stdout(predicate::str::contains("overhang"))
        .stdout(predicate::str::contains("Channels passing over pads"));
}
