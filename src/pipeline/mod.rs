//! Scan pipeline
//!
//! Orchestrates one scan end to end:
//! 1. Capture a screenshot (tiered fallback)
//! 2. Analyze it with the vision classifier
//! 3. Score the issues
//! 4. Assemble the report
//!
//! [`Pipeline::run`] always returns a [`Report`]. Capture exhaustion,
//! internal errors and panics all become failure reports.

use anyhow::Result;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info};

use crate::capture::CaptureOrchestrator;
use crate::classifier::Analyzer;
use crate::models::{Report, ReportMetadata};
use crate::scoring;
use crate::steplog::{Step, StepRecorder};

/// Default scan label
pub const DEFAULT_TEST_TYPE: &str = "WCAG Accessibility Scan";

/// Full scan pipeline.
pub struct Pipeline {
    capture: CaptureOrchestrator,
    analyzer: Analyzer,
    log: Arc<dyn StepRecorder>,
    extended_analysis: bool,
    web_grounding: bool,
}

impl Pipeline {
    pub fn new(capture: CaptureOrchestrator, analyzer: Analyzer, log: Arc<dyn StepRecorder>) -> Self {
        Self {
            capture,
            analyzer,
            log,
            extended_analysis: true,
            web_grounding: true,
        }
    }

    /// Set the analysis flags recorded in report metadata.
    pub fn with_flags(mut self, extended_analysis: bool, web_grounding: bool) -> Self {
        self.extended_analysis = extended_analysis;
        self.web_grounding = web_grounding;
        self
    }

    /// Model id the analyzer will use
    pub fn model_id(&self) -> String {
        self.analyzer.model_id()
    }

    pub fn extended_analysis(&self) -> bool {
        self.extended_analysis
    }

    pub fn web_grounding(&self) -> bool {
        self.web_grounding
    }

    /// Run one scan. Never fails; see module docs.
    pub fn run(&self, url: &str, test_type: &str) -> Report {
        self.log.record(
            Step::new("test_start", "info")
                .with("url", url)
                .with("test_type", test_type),
        );
        info!("Starting {} for {}", test_type, url);

        let result = catch_unwind(AssertUnwindSafe(|| self.run_inner(url, test_type)));

        match result {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                error!("Scan of {} failed: {:#}", url, e);
                self.log.record(
                    Step::new("test_end", "internal_error").with("error", format!("{:#}", e)),
                );
                Report::failure(url, test_type, format!("Internal Error: {:#}", e))
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                error!("Scan of {} panicked: {}", url, panic_msg);
                self.log.record(
                    Step::new("test_end", "internal_error").with("error", panic_msg.clone()),
                );
                Report::failure(url, test_type, format!("Internal Error: {}", panic_msg))
            }
        }
    }

    fn run_inner(&self, url: &str, test_type: &str) -> Result<Report> {
        let capture = match self.capture.capture(url) {
            Ok(capture) => capture,
            Err(e) => {
                let message = e.to_string();
                self.log
                    .record(Step::new("test_end", "engine_failure").with("error", message.clone()));
                return Ok(Report::failure(url, test_type, message));
            }
        };
        info!("Captured {} via {}", capture.path.display(), capture.backend);

        let outcome = self.analyzer.analyze(&capture.path);
        let summary = scoring::score(&outcome.issues);

        self.log.record(
            Step::new("test_end", "success")
                .with("issue_count", outcome.issues.len())
                .with("score", summary.overall_score)
                .with("degraded", outcome.degraded),
        );

        let metadata = ReportMetadata {
            model: outcome.model,
            capture_backend: capture.backend,
            grounding_sources: outcome.grounding_sources,
            assessment: outcome.assessment,
            extended_analysis: self.extended_analysis,
            web_grounding: self.web_grounding,
            analysis_degraded: outcome.degraded,
        };

        Ok(Report::success(
            url,
            test_type,
            outcome.issues,
            summary,
            capture.path,
            metadata,
        ))
    }
}
