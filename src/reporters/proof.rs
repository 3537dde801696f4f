//! Batch proof document
//!
//! One entry per scanned site, keyed by URL.

use crate::models::{Report, Severity};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;

/// Longest error text kept per site
const MAX_ERROR_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SiteResult {
    Success {
        score: u32,
        wcag_level: String,
        issues_count: usize,
        critical: usize,
        major: usize,
    },
    Error {
        error: String,
    },
}

impl SiteResult {
    pub fn from_report(report: &Report) -> Self {
        match (&report.error, &report.summary) {
            (None, Some(summary)) => {
                let issues = report.issues.as_deref().unwrap_or_default();
                let count = |severity| issues.iter().filter(|i| i.severity == severity).count();
                SiteResult::Success {
                    score: summary.overall_score,
                    wcag_level: summary.wcag_level.label().to_string(),
                    issues_count: issues.len(),
                    critical: count(Severity::Critical),
                    major: count(Severity::Major),
                }
            }
            (error, _) => SiteResult::Error {
                error: error
                    .as_deref()
                    .unwrap_or("missing summary")
                    .chars()
                    .take(MAX_ERROR_CHARS)
                    .collect(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SiteResult::Success { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchProof {
    pub tested_at: DateTime<Local>,
    pub model: String,
    pub extended_thinking: bool,
    pub web_grounding: bool,
    pub websites: BTreeMap<String, SiteResult>,
}

impl BatchProof {
    pub fn new(model: impl Into<String>, extended_thinking: bool, web_grounding: bool) -> Self {
        Self {
            tested_at: Local::now(),
            model: model.into(),
            extended_thinking,
            web_grounding,
            websites: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, report: &Report) {
        self.websites
            .insert(report.url.clone(), SiteResult::from_report(report));
    }

    pub fn success_count(&self) -> usize {
        self.websites.values().filter(|r| r.is_success()).count()
    }
}
