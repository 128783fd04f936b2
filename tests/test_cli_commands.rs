//! Binary-level CLI tests: output and exit codes
//!
//! Every command runs inside an empty temp directory with HANDOFFCHECK_HOME
//! unset, so no ambient configuration leaks in. Correction is never enabled,
//! so no backend is contacted.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn handoffcheck(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("handoffcheck").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("HANDOFFCHECK_HOME")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn validate_accepts_valid_payload_with_detected_type() {
    let dir = TempDir::new().unwrap();
    handoffcheck(&dir)
        .arg("validate")
        .arg(fixture("content_valid.json"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("✓ content-to-design: valid"))
        .stdout(predicate::str::contains("trace_id: content-1700000000000-abcd"));
}

#[test]
fn validate_rejects_invalid_payload_with_exit_code_3() {
    let dir = TempDir::new().unwrap();
    handoffcheck(&dir)
        .args(["validate", "--type", "content-to-design"])
        .arg(fixture("content_empty_copy.json"))
        .assert()
        .code(3)
        .stdout(predicate::str::contains("✗ content-to-design: invalid"))
        .stdout(predicate::str::contains("Errors:"));
}

#[test]
fn validate_json_output_is_a_report() {
    let dir = TempDir::new().unwrap();
    let output = handoffcheck(&dir)
        .args(["validate", "--json", "--type", "quality-to-delivery"])
        .arg(fixture("quality_spammy.json"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["final_state"], "invalid");
    assert_eq!(report["correction_attempts"], 0);
    assert_eq!(report["trace_id"], "quality-1700000000000-abcd");
    assert_eq!(report["result"]["is_valid"], false);
    assert!(report["duration_ms"].is_u64());
    assert!(report.get("failure_reason").is_none());
}

#[test]
fn validate_reads_stdin() {
    let dir = TempDir::new().unwrap();
    let payload = std::fs::read_to_string(fixture("content_valid.json")).unwrap();
    handoffcheck(&dir)
        .args(["validate", "-"])
        .write_stdin(payload)
        .assert()
        .success();
}

#[test]
fn validate_without_determinable_type_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    handoffcheck(&dir)
        .arg("validate")
        .arg(fixture("content_empty_copy.json"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Cannot determine the handoff type"));
}

#[test]
fn validate_unknown_type_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    handoffcheck(&dir)
        .args(["validate", "--type", "content-to-print"])
        .arg(fixture("content_valid.json"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown handoff type"));
}

#[test]
fn validate_malformed_json_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{\"trace_id\": ").unwrap();
    handoffcheck(&dir)
        .args(["validate", "--type", "content-to-design"])
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not valid JSON"));
}

#[test]
fn package_rejects_oversized_delivery() {
    let dir = TempDir::new().unwrap();
    handoffcheck(&dir)
        .arg("package")
        .arg(fixture("delivery_oversized.json"))
        .assert()
        .code(3)
        .stdout(predicate::str::contains("delivery-package: rejected"))
        .stdout(predicate::str::contains("total_size_bytes"))
        .stdout(predicate::str::contains("size_limit"));
}

#[test]
fn contract_prints_constraints() {
    let dir = TempDir::new().unwrap();
    handoffcheck(&dir)
        .args(["contract", "content-to-design"])
        .assert()
        .success()
        .stdout(predicate::str::contains("subject: 1-100 characters"));
}

#[test]
fn contract_rejects_unknown_name() {
    let dir = TempDir::new().unwrap();
    handoffcheck(&dir)
        .args(["contract", "print-to-fax"])
        .assert()
        .code(2);
}

#[test]
fn config_reports_file_and_cli_sources() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("handoffcheck.toml");
    std::fs::write(
        &config_path,
        "[validation]\nmax_retry_attempts = 2\n\n[monitor]\nmax_alerts = 50\n",
    )
    .unwrap();

    let output = handoffcheck(&dir)
        .arg("--config")
        .arg(&config_path)
        .args(["--max-validation-time-ms", "5000", "config", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let effective = &value["effective_config"];
    assert_eq!(effective["max_retry_attempts"]["value"], "2");
    assert_eq!(effective["max_retry_attempts"]["source"], "config");
    assert_eq!(effective["max_alerts"]["value"], "50");
    assert_eq!(effective["max_validation_time_ms"]["source"], "cli");
    assert_eq!(effective["allow_correction"]["source"], "default");
}

#[test]
fn config_file_is_discovered_upward() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join(".git")).unwrap();
    std::fs::create_dir(dir.path().join(".handoffcheck")).unwrap();
    std::fs::write(
        dir.path().join(".handoffcheck").join("config.toml"),
        "[validation]\nagent_id = \"design-agent\"\n",
    )
    .unwrap();
    let nested = dir.path().join("pipeline").join("stage");
    std::fs::create_dir_all(&nested).unwrap();

    handoffcheck(&dir)
        .current_dir(&nested)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("design-agent"))
        .stdout(predicate::str::contains("(config)"));
}

#[test]
fn missing_explicit_config_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    handoffcheck(&dir)
        .args(["--config", "does-not-exist.toml", "config"])
        .assert()
        .code(2);
}

#[test]
fn invalid_config_value_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("handoffcheck.toml");
    std::fs::write(&config_path, "[validation]\nmax_retry_attempts = 9\n").unwrap();
    handoffcheck(&dir)
        .arg("--config")
        .arg(&config_path)
        .arg("config")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("max_retry_attempts"));
}
