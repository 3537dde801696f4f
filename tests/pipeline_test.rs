//! End-to-end pipeline tests against stub capture tiers and a stub model
//!
//! Steps are written to a real JSONL log in a temp dir so the on-disk
//! record of a run can be checked.

use a11yscan::capture::{CaptureBackend, CaptureError, CaptureOrchestrator, CaptureResult};
use a11yscan::classifier::{
    AnalysisPrompt, Analyzer, ClassifierError, ClassifierResult, ImagePayload, VisionModel,
};
use a11yscan::models::{ConformanceLevel, Principle, Severity};
use a11yscan::pipeline::{Pipeline, DEFAULT_TEST_TYPE};
use a11yscan::reporters::{BatchProof, LiveReport};
use a11yscan::retry::RetryPolicy;
use a11yscan::steplog::{JsonlStepLog, StepRecorder};
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fails every attempt, counting calls
struct AlwaysFails(Arc<AtomicU32>);

impl CaptureBackend for AlwaysFails {
    fn name(&self) -> &str {
        "agent_browser"
    }
    fn capture(&self, _url: &str, _output: &Path) -> CaptureResult<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Err(CaptureError::Unavailable {
            backend: "agent_browser".into(),
            reason: "agent browser command not configured".into(),
        })
    }
}

/// Fails once, then writes a PNG
struct FlakyChrome(AtomicU32);

impl CaptureBackend for FlakyChrome {
    fn name(&self) -> &str {
        "headless_chrome"
    }
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(2, Duration::ZERO)
    }
    fn capture(&self, _url: &str, output: &Path) -> CaptureResult<()> {
        if self.0.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(CaptureError::Failed("headless_chrome timed out after 30s".into()));
        }
        std::fs::write(output, b"\x89PNG\r\n\x1a\nstub")?;
        Ok(())
    }
}

struct CannedModel(&'static str);

impl VisionModel for CannedModel {
    fn model_id(&self) -> &str {
        "amazon.nova-pro-v1:0"
    }
    fn describe(&self, _prompt: &str, image: &ImagePayload) -> ClassifierResult<String> {
        assert!(!image.bytes.is_empty());
        Ok(self.0.to_string())
    }
}

struct Throttled;

impl VisionModel for Throttled {
    fn model_id(&self) -> &str {
        "amazon.nova-pro-v1:0"
    }
    fn describe(&self, _prompt: &str, _image: &ImagePayload) -> ClassifierResult<String> {
        Err(ClassifierError::ApiError {
            status: 429,
            message: "ThrottlingException".into(),
        })
    }
}

const REPLY: &str = r#"Here is my analysis:
```json
{
  "issues": [
    {"wcag_id": "1.4.3", "principle": "Operable", "icon": "error", "title": "Low contrast",
     "description": "Grey on white", "severity": "CRITICAL", "howToFix": "Darken text",
     "whyMatters": "Low vision users", "confidence": 0.9},
    {"wcag_id": "2.4.4", "title": "Ambiguous link", "severity": "major"},
    {"wcag_id": "4.1.2", "title": "Unlabelled button", "severity": "whatever"}
  ],
  "grounding_sources": ["https://www.w3.org/WAI/WCAG21/Understanding/contrast-minimum"],
  "overall_assessment": "Several contrast and labelling problems."
}
```"#;

fn read_log(log: &JsonlStepLog) -> Vec<Value> {
    std::fs::read_to_string(log.current_path())
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

fn build(
    dir: &Path,
    backends: Vec<Box<dyn CaptureBackend>>,
    model: Box<dyn VisionModel>,
) -> (Pipeline, Arc<JsonlStepLog>) {
    let log = Arc::new(JsonlStepLog::new(dir.join("logs")));
    let recorder: Arc<dyn StepRecorder> = log.clone();
    let capture = CaptureOrchestrator::new(backends, dir.join("shots"), recorder.clone());
    let analyzer = Analyzer::with_model(
        model,
        AnalysisPrompt::new(true, true),
        RetryPolicy::new(3, Duration::ZERO),
        recorder.clone(),
    );
    (Pipeline::new(capture, analyzer, recorder), log)
}

#[test]
fn test_full_scan_with_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let agent_calls = Arc::new(AtomicU32::new(0));
    let (pipeline, log) = build(
        dir.path(),
        vec![
            Box::new(AlwaysFails(agent_calls.clone())),
            Box::new(FlakyChrome(AtomicU32::new(0))),
        ],
        Box::new(CannedModel(REPLY)),
    );

    let report = pipeline.run("https://example.com", DEFAULT_TEST_TYPE);
    assert!(report.error.is_none());
    assert_eq!(agent_calls.load(Ordering::SeqCst), 1);

    let screenshot = report.screenshot_path.clone().unwrap();
    assert!(screenshot.starts_with(dir.path().join("shots")));
    assert!(screenshot
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("audit_"));

    let issues = report.issues.as_ref().unwrap();
    assert_eq!(issues.len(), 3);
    // Model-supplied principle is ignored in favour of the WCAG id
    assert_eq!(issues[0].principle, Some(Principle::Perceivable));
    assert_eq!(issues[2].severity, Severity::Minor);
    assert_eq!(issues[1].confidence, 0.5);

    // Perceivable 80, Operable 90, Understandable 100, Robust 96
    let summary = report.summary.as_ref().unwrap();
    assert_eq!(summary.principle_score(Principle::Robust), 96);
    assert_eq!(summary.overall_score, 91);
    assert_eq!(summary.wcag_level, ConformanceLevel::AaaEnhanced);

    let metadata = report.metadata.as_ref().unwrap();
    assert_eq!(metadata.capture_backend, "headless_chrome");
    assert_eq!(metadata.grounding_sources.len(), 1);
    assert!(metadata.extended_analysis);

    let entries = read_log(&log);
    let statuses: Vec<(String, String)> = entries
        .iter()
        .map(|e| {
            (
                e["action"].as_str().unwrap().to_string(),
                e["status"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    let expected = [
        ("test_start", "info"),
        ("capture_agent_browser", "attempting"),
        ("capture_agent_browser", "failed"),
        ("capture_headless_chrome", "attempting"),
        ("capture_headless_chrome", "failed"),
        ("capture_headless_chrome", "attempting"),
        ("capture_headless_chrome", "success"),
        ("classifier_analysis", "success"),
        ("test_end", "success"),
    ];
    let expected: Vec<(String, String)> = expected
        .iter()
        .map(|(a, s)| (a.to_string(), s.to_string()))
        .collect();
    assert_eq!(statuses, expected);
    assert_eq!(entries[2]["error"], "agent_browser is not available: agent browser command not configured");
}

#[test]
fn test_throttled_classifier_degrades_to_clean_report() {
    let dir = tempfile::tempdir().unwrap();
    let (pipeline, log) = build(
        dir.path(),
        vec![Box::new(FlakyChrome(AtomicU32::new(1)))],
        Box::new(Throttled),
    );

    let report = pipeline.run("https://example.com", DEFAULT_TEST_TYPE);
    assert!(report.error.is_none());
    assert_eq!(report.issue_count(), 0);
    assert_eq!(report.overall_score(), Some(100));
    assert!(report.metadata.as_ref().unwrap().analysis_degraded);

    let errors: Vec<Value> = read_log(&log)
        .into_iter()
        .filter(|e| e["action"] == "classifier_analysis")
        .collect();
    assert_eq!(errors.len(), 3);
    assert!(errors[0]["error"].as_str().unwrap().contains("429"));
}

#[test]
fn test_batch_proof_from_runs() {
    let dir = tempfile::tempdir().unwrap();
    let (pipeline, _) = build(
        dir.path(),
        vec![Box::new(FlakyChrome(AtomicU32::new(1)))],
        Box::new(CannedModel(REPLY)),
    );

    let mut proof = BatchProof::new(pipeline.model_id(), true, true);
    proof.record(&pipeline.run("https://example.com", DEFAULT_TEST_TYPE));
    proof.record(&pipeline.run("javascript:alert(1)", DEFAULT_TEST_TYPE));
    assert_eq!(proof.success_count(), 1);

    let json = serde_json::to_value(&proof).unwrap();
    assert_eq!(json["model"], "amazon.nova-pro-v1:0");
    assert_eq!(json["websites"]["https://example.com"]["critical"], 1);
    assert_eq!(json["websites"]["javascript:alert(1)"]["status"], "error");

    let live = LiveReport::from_report(&pipeline.run("https://example.com", DEFAULT_TEST_TYPE));
    assert_eq!(live.summary.passed, 22);
    assert_eq!(live.summary.score, 91);
}
