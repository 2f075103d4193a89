//! Tests for the agentready binary: flags, output formats, exit codes

use std::path::Path;
use std::process::Command;

fn agentready_bin() -> String {
    env!("CARGO_BIN_EXE_agentready").to_string()
}

fn setup_test_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("README.md"), "# demo\n\nSmall demo project.\n")
        .expect("Failed to write README");
    std::fs::create_dir_all(dir.path().join("demo")).expect("Failed to create package");
    std::fs::write(
        dir.path().join("demo/core.py"),
        "def area(width: float, height: float) -> float:\n    \"\"\"Rectangle area.\"\"\"\n    return width * height\n",
    )
    .expect("Failed to write source");
    dir
}

/// Run agentready and return (exit code, stdout, stderr)
fn run(dir: &Path, extra_args: &[&str]) -> (i32, String, String) {
    let output = Command::new(agentready_bin())
        .arg(dir)
        .args(extra_args)
        .output()
        .expect("Failed to run agentready");
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

#[test]
fn test_text_output() {
    let dir = setup_test_repo();
    let (code, stdout, _) = run(dir.path(), &[]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Composite:"));
    assert!(stdout.contains("CATEGORIES"));
}

#[test]
fn test_json_output_is_valid() {
    let dir = setup_test_repo();
    let (code, stdout, _) = run(dir.path(), &["--format", "json", "--log-level", "debug"]);
    assert_eq!(code, 0);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("stdout should be JSON");
    assert_eq!(value["languages"][0], "python");
    assert!(value["scored"]["composite"].is_number());
}

#[test]
fn test_threshold_gate() {
    let dir = setup_test_repo();
    let (code, _, stderr) = run(dir.path(), &["--threshold", "10.5"]);
    assert_eq!(code, 1, "composite can never reach 10.5");
    assert!(stderr.contains("below threshold"));

    let (code, _, _) = run(dir.path(), &["--threshold", "0"]);
    assert_eq!(code, 0);
}

#[test]
fn test_cli_threshold_overrides_config() {
    let dir = setup_test_repo();
    std::fs::write(
        dir.path().join("agentready.toml"),
        "[scoring]\nthreshold = 10.5\n",
    )
    .expect("Failed to write config");

    let (code, _, _) = run(dir.path(), &[]);
    assert_eq!(code, 1, "config threshold applies by default");

    let (code, _, _) = run(dir.path(), &["--threshold", "1"]);
    assert_eq!(code, 0, "--threshold wins over the config file");
}

#[test]
fn test_explicit_config_must_exist() {
    let dir = setup_test_repo();
    let (code, _, stderr) = run(dir.path(), &["--config", "missing.toml"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("missing.toml"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = setup_test_repo();
    std::fs::write(dir.path().join("agentready.toml"), "version = 7\n")
        .expect("Failed to write config");
    let (code, _, stderr) = run(dir.path(), &[]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unsupported config version 7"));
}

#[test]
fn test_no_recommendations_flag() {
    let dir = setup_test_repo();
    let (code, stdout, _) = run(dir.path(), &["--format", "json", "--no-recommendations"]);
    assert_eq!(code, 0);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("stdout should be JSON");
    assert_eq!(value["recommendations"], serde_json::json!([]));
}
