//! Screenshot analysis with retry and soft degradation
//!
//! Analysis never fails a run that already has a screenshot: a missing
//! credential, an unreadable file, repeated API errors or an unparseable
//! reply all degrade to "zero issues detected" with an assessment string
//! explaining why.

use crate::classifier::client::{ClassifierConfig, ImagePayload, VisionClient, VisionModel};
use crate::classifier::extract::extract_json;
use crate::classifier::prompts::AnalysisPrompt;
use crate::classifier::ClassifierResult;
use crate::models::{Issue, RawIssue};
use crate::retry::RetryPolicy;
use crate::steplog::{Step, StepRecorder};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

const STEP_ACTION: &str = "classifier_analysis";

/// Result of analyzing one screenshot
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub issues: Vec<Issue>,
    pub grounding_sources: Vec<String>,
    pub assessment: String,
    pub model: String,
    /// True when the issues list is empty because analysis failed
    pub degraded: bool,
}

impl AnalysisOutcome {
    fn degraded(model: impl Into<String>, assessment: impl Into<String>) -> Self {
        Self {
            issues: Vec::new(),
            grounding_sources: Vec::new(),
            assessment: assessment.into(),
            model: model.into(),
            degraded: true,
        }
    }
}

/// Issues and metadata parsed from a model reply
#[derive(Debug, Clone, Default)]
pub struct ParsedAnalysis {
    pub issues: Vec<Issue>,
    pub grounding_sources: Vec<String>,
    pub assessment: String,
    /// Entries in the issues array that couldn't be read as issues
    pub skipped: usize,
}

/// Parse an extracted JSON value.
///
/// Accepts the requested object shape or a bare issues array.
pub fn parse_analysis(value: Value) -> ParsedAnalysis {
    let (raw_issues, grounding_sources, assessment) = match value {
        Value::Array(items) => (items, Vec::new(), String::new()),
        Value::Object(mut obj) => {
            let items = match obj.remove("issues") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            let sources = match obj.remove("grounding_sources") {
                Some(Value::Array(sources)) => sources
                    .into_iter()
                    .filter_map(|s| match s {
                        Value::String(s) => Some(s),
                        Value::Object(o) => o
                            .get("url")
                            .or_else(|| o.get("title"))
                            .and_then(|v| v.as_str())
                            .map(str::to_string),
                        _ => None,
                    })
                    .collect(),
                _ => Vec::new(),
            };
            let assessment = obj
                .get("overall_assessment")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            (items, sources, assessment)
        }
        _ => (Vec::new(), Vec::new(), String::new()),
    };

    let mut parsed = ParsedAnalysis {
        grounding_sources,
        assessment,
        ..Default::default()
    };
    for item in raw_issues {
        match serde_json::from_value::<RawIssue>(item) {
            Ok(raw) => parsed.issues.push(Issue::from_raw(raw)),
            Err(e) => {
                debug!("Skipping malformed issue entry: {}", e);
                parsed.skipped += 1;
            }
        }
    }
    parsed
}

enum ModelSource {
    /// Built on first use from config + environment
    Lazy(ClassifierConfig),
    Ready(Box<dyn VisionModel>),
}

/// Screenshot analyzer
pub struct Analyzer {
    source: ModelSource,
    prompt: AnalysisPrompt,
    retry: RetryPolicy,
    log: Arc<dyn StepRecorder>,
}

impl Analyzer {
    /// Credentials are not read until [`Analyzer::analyze`] needs them
    pub fn from_config(config: ClassifierConfig, log: Arc<dyn StepRecorder>) -> Self {
        Self {
            prompt: AnalysisPrompt::new(config.extended_analysis, config.web_grounding),
            retry: RetryPolicy::new(config.max_attempts, config.backoff_base),
            source: ModelSource::Lazy(config),
            log,
        }
    }

    /// Use an already-built model
    pub fn with_model(
        model: Box<dyn VisionModel>,
        prompt: AnalysisPrompt,
        retry: RetryPolicy,
        log: Arc<dyn StepRecorder>,
    ) -> Self {
        Self {
            source: ModelSource::Ready(model),
            prompt,
            retry,
            log,
        }
    }

    /// Model id as configured, without connecting
    pub fn model_id(&self) -> String {
        match &self.source {
            ModelSource::Lazy(config) => config.model().to_string(),
            ModelSource::Ready(model) => model.model_id().to_string(),
        }
    }

    fn connect(&self) -> ClassifierResult<Option<Box<dyn VisionModel>>> {
        match &self.source {
            ModelSource::Lazy(config) => {
                let client = VisionClient::from_env_with_config(config.clone())?;
                Ok(Some(Box::new(client)))
            }
            ModelSource::Ready(_) => Ok(None),
        }
    }

    /// Analyze the screenshot at `path`. Never fails; see module docs.
    pub fn analyze(&self, path: &Path) -> AnalysisOutcome {
        let model_id = self.model_id();

        let bytes = match std::fs::read(path) {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => return self.give_up(&model_id, "unreadable_screenshot", "Screenshot file is empty".to_string()),
            Err(e) => {
                return self.give_up(
                    &model_id,
                    "unreadable_screenshot",
                    format!("Could not read screenshot {}: {}", path.display(), e),
                )
            }
        };
        let image = ImagePayload::new(bytes);

        let connected = match self.connect() {
            Ok(connected) => connected,
            Err(e) => return self.give_up(&model_id, "not_configured", e.to_string()),
        };
        let model: &dyn VisionModel = match (&connected, &self.source) {
            (Some(model), _) => model.as_ref(),
            (None, ModelSource::Ready(model)) => model.as_ref(),
            (None, ModelSource::Lazy(_)) => {
                return self.give_up(&model_id, "not_configured", "Classifier unavailable".to_string())
            }
        };

        let prompt = self.prompt.render();

        for attempt_index in 0..self.retry.max_attempts {
            let attempt = attempt_index + 1;
            info!("Calling {} (attempt {})", model_id, attempt);

            match model.describe(&prompt, &image) {
                Ok(text) => return self.interpret(&model_id, attempt, &text),
                Err(e) => {
                    warn!("Classifier attempt {} failed: {}", attempt, e);
                    self.log.record(
                        Step::new(STEP_ACTION, "error")
                            .with("attempt", attempt)
                            .with("error", e.to_string()),
                    );
                    self.retry.backoff(attempt_index);
                }
            }
        }

        AnalysisOutcome::degraded(
            model_id,
            format!(
                "Analysis unavailable: classifier failed after {} attempts",
                self.retry.max_attempts
            ),
        )
    }

    fn interpret(&self, model_id: &str, attempt: u32, text: &str) -> AnalysisOutcome {
        let value = match extract_json(text) {
            Ok(value) => value,
            Err(e) => {
                let raw: String = text.chars().take(200).collect();
                self.log.record(
                    Step::new(STEP_ACTION, "no_json_found")
                        .with("attempt", attempt)
                        .with("error", e.to_string())
                        .with("raw", raw),
                );
                return AnalysisOutcome::degraded(
                    model_id,
                    format!("Analysis unavailable: {}", e),
                );
            }
        };

        let parsed = parse_analysis(value);
        if parsed.skipped > 0 {
            warn!("Skipped {} malformed issue entries", parsed.skipped);
        }
        self.log.record(
            Step::new(STEP_ACTION, "success")
                .with("attempt", attempt)
                .with("issue_count", parsed.issues.len())
                .with("skipped", parsed.skipped),
        );

        AnalysisOutcome {
            issues: parsed.issues,
            grounding_sources: parsed.grounding_sources,
            assessment: parsed.assessment,
            model: model_id.to_string(),
            degraded: false,
        }
    }

    fn give_up(&self, model_id: &str, status: &str, reason: String) -> AnalysisOutcome {
        warn!("Skipping analysis: {}", reason);
        self.log
            .record(Step::new(STEP_ACTION, status).with("error", reason.clone()));
        AnalysisOutcome::degraded(model_id, reason)
    }
}
