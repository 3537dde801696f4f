//! Integration tests for the a11yscan CLI
//!
//! These tests run the actual binary to verify:
//! - Offline scoring prints a framed JSON block
//! - A scan that can't capture anything still prints a well-formed report
//!   and exits 0
//! - The live report file is written on request
//!
//! Each test uses its own temp directory as working directory so step logs
//! and screenshots never land in the repo. Nothing here touches the network.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_a11yscan"))
}

/// Run the binary in `dir` with a clean scanner environment
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(binary_path())
        .args(args)
        .current_dir(dir)
        .env_remove("A11YSCAN_AGENT_CMD")
        .env_remove("A11YSCAN_BACKEND")
        .env_remove("A11YSCAN_MODEL")
        .env("A11YSCAN_CHROME", "/nonexistent/chrome")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute a11yscan binary");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

/// JSON text between the report markers
fn extract_block(stdout: &str) -> Option<serde_json::Value> {
    let start = stdout.find("---JSON_START---")? + "---JSON_START---".len();
    let end = start + stdout[start..].find("---JSON_END---")?;
    serde_json::from_str(stdout[start..end].trim()).ok()
}

/// Config that keeps every path inside the temp dir and never sleeps
fn write_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("a11yscan.toml");
    std::fs::write(
        &path,
        r#"
[classifier]
max_attempts = 1
backoff_base_ms = 0

[capture]
screenshot_dir = "shots"
timeout_secs = 5
backoff_base_ms = 0

[output]
log_dir = "logs"
live_report_path = "web/public/live_report.json"
"#,
    )
    .unwrap();
    path
}

#[test]
fn test_score_issue_array() {
    let dir = tempfile::tempdir().unwrap();
    let issues = dir.path().join("issues.json");
    std::fs::write(
        &issues,
        r#"[{"wcag_id": "1.1.1", "severity": "CRITICAL", "title": "Missing alt text"}]"#,
    )
    .unwrap();

    let (stdout, stderr, code) = run_cli(dir.path(), &["score", "--issues", issues.to_str().unwrap()]);
    assert_eq!(code, 0, "stderr: {}", stderr);

    let summary = extract_block(&stdout).expect("framed JSON block");
    assert_eq!(summary["overall_score"], 95);
    assert_eq!(summary["wcag_level"], "AAA - Enhanced");
    assert_eq!(summary["scores_by_principle"]["Perceivable"], 80);
    assert_eq!(summary["critical_count"], 1);
}

#[test]
fn test_score_issue_object_with_unclassified() {
    let dir = tempfile::tempdir().unwrap();
    let issues = dir.path().join("issues.json");
    std::fs::write(
        &issues,
        r#"{"issues": [
            {"wcag_id": "", "severity": "MAJOR", "title": "Vague"},
            {"wcag_id": "9.9.9", "severity": "minor", "title": "Unknown criterion"}
        ]}"#,
    )
    .unwrap();

    let (stdout, _, code) = run_cli(dir.path(), &["score", "--issues", issues.to_str().unwrap()]);
    assert_eq!(code, 0);

    let summary = extract_block(&stdout).unwrap();
    assert_eq!(summary["overall_score"], 100);
    assert_eq!(summary["total_issues"], 2);
    assert_eq!(summary["unclassified_count"], 2);
}

#[test]
fn test_score_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["score", "--issues", "nope.json"]);
    assert_ne!(code, 0);
    assert!(extract_block(&stdout).is_none());
}

#[test]
fn test_run_total_capture_failure_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir);

    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "run",
            "--url",
            "ftp://example.com",
            "--live-report",
        ],
    );
    assert_eq!(code, 0, "stderr: {}", stderr);

    let report = extract_block(&stdout).expect("framed JSON block");
    assert_eq!(report["url"], "ftp://example.com");
    assert_eq!(report["test_type"], "WCAG Accessibility Scan");
    assert!(report["error"]
        .as_str()
        .unwrap()
        .contains("Could not capture screenshot"));
    assert!(report.get("issues").is_none());
    assert!(report.get("screenshot_path").is_none());

    let live_path = dir.path().join("web/public/live_report.json");
    let live: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(live_path).unwrap()).unwrap();
    assert_eq!(live["summary"]["score"], 0);
    assert_eq!(live["summary"]["total"], 25);
}

#[test]
fn test_run_writes_step_log() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir);

    let (_, _, code) = run_cli(
        dir.path(),
        &["--config", config.to_str().unwrap(), "run", "--url", "not a url", "--type", "Smoke"],
    );
    assert_eq!(code, 0);

    let logs: Vec<PathBuf> = std::fs::read_dir(dir.path().join("logs"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(logs.len(), 1);

    let content = std::fs::read_to_string(&logs[0]).unwrap();
    let entries: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(entries.first().unwrap()["action"], "test_start");
    assert_eq!(entries.first().unwrap()["test_type"], "Smoke");
    let last = entries.last().unwrap();
    assert_eq!(last["action"], "test_end");
    assert_eq!(last["status"], "engine_failure");
    assert!(entries.iter().all(|e| e["timestamp"].is_string()));
}

#[test]
fn test_run_no_log_leaves_no_log_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir);

    let (stdout, _, code) = run_cli(
        dir.path(),
        &["--config", config.to_str().unwrap(), "run", "--url", "mailto:a@b.c", "--no-log"],
    );
    assert_eq!(code, 0);
    assert!(extract_block(&stdout).is_some());
    assert!(!dir.path().join("logs").exists());
}

#[test]
fn test_run_with_unparseable_config_still_reports() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "this is [[ not valid toml {{{}}}").unwrap();

    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &["--config", config.to_str().unwrap(), "run", "--url", "https://example.com"],
    );
    assert_eq!(code, 0, "stderr: {}", stderr);

    let report = extract_block(&stdout).expect("framed JSON block");
    assert_eq!(report["url"], "https://example.com");
    assert_eq!(report["test_type"], "WCAG Accessibility Scan");
    let error = report["error"].as_str().unwrap();
    assert!(error.starts_with("Configuration Error:"), "error: {}", error);
    assert!(error.contains("bad.toml"));
    assert!(report.get("issues").is_none());
}

#[test]
fn test_doctor_reports_unconfigured_agent() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("a11yscan.toml");
    std::fs::write(&config, "[capture]\nagent_command = []\n").unwrap();

    let (stdout, _, code) = run_cli(dir.path(), &["--config", config.to_str().unwrap(), "doctor"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Agent browser: not configured"));
}

#[test]
fn test_doctor_shows_agent_command() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("a11yscan.toml");
    std::fs::write(
        &config,
        "[capture]\nagent_command = [\"agent-browser\", \"shot\", \"{url}\", \"{output}\"]\n",
    )
    .unwrap();

    let (stdout, _, code) = run_cli(dir.path(), &["--config", config.to_str().unwrap(), "doctor"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Agent browser: agent-browser shot {url} {output}"));
}

#[test]
fn test_doctor_runs() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir);
    let (stdout, _, code) = run_cli(dir.path(), &["--config", config.to_str().unwrap(), "doctor"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Classifier"));
    assert!(stdout.contains("Headless Chrome"));
}
