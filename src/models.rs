//! Core data models for a11yscan
//!
//! These models flow one way through the pipeline:
//! screenshot → [`Issue`] list → [`ScoreSummary`] → [`Report`].

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Severity levels for issues, as assigned by the classifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    #[default]
    Minor,
    Major,
    Critical,
}

impl Severity {
    /// Parse a severity label case-insensitively.
    ///
    /// Anything unrecognized is treated as [`Severity::Minor`].
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Severity::Critical,
            "MAJOR" => Severity::Major,
            "MINOR" => Severity::Minor,
            "INFO" => Severity::Info,
            _ => Severity::Minor,
        }
    }

    /// Points deducted from a principle score per issue of this severity
    pub fn deduction(&self) -> u32 {
        match self {
            Severity::Critical => 20,
            Severity::Major => 10,
            Severity::Minor => 4,
            Severity::Info => 1,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::Major => write!(f, "MAJOR"),
            Severity::Minor => write!(f, "MINOR"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw
            .as_ref()
            .and_then(|v| v.as_str())
            .map(Severity::parse_lenient)
            .unwrap_or_default())
    }
}

/// Icon/kind tag shown next to an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Error,
    Warning,
    Info,
}

impl IssueKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Some(IssueKind::Error),
            "warning" | "warn" => Some(IssueKind::Warning),
            "info" => Some(IssueKind::Info),
            _ => None,
        }
    }

    /// Fallback icon when the classifier didn't supply a usable one
    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Critical | Severity::Major => IssueKind::Error,
            Severity::Minor => IssueKind::Warning,
            Severity::Info => IssueKind::Info,
        }
    }
}

/// Top-level WCAG principle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Principle {
    Perceivable,
    Operable,
    Understandable,
    Robust,
}

impl Principle {
    pub const ALL: [Principle; 4] = [
        Principle::Perceivable,
        Principle::Operable,
        Principle::Understandable,
        Principle::Robust,
    ];
}

impl std::fmt::Display for Principle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Principle::Perceivable => write!(f, "Perceivable"),
            Principle::Operable => write!(f, "Operable"),
            Principle::Understandable => write!(f, "Understandable"),
            Principle::Robust => write!(f, "Robust"),
        }
    }
}

/// One detected accessibility defect
///
/// Field names on the wire follow the classifier's response shape
/// (`wcag_id`, `howToFix`, `whyMatters`) so the presentation front end
/// can read reports without a mapping layer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Issue {
    /// Dotted WCAG success criterion, e.g. "1.4.3" (may be empty)
    pub wcag_id: String,
    /// Derived from `wcag_id`; `None` means unclassified
    pub principle: Option<Principle>,
    pub icon: IssueKind,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(rename = "howToFix")]
    pub how_to_fix: String,
    #[serde(rename = "whyMatters")]
    pub why_matters: String,
    pub severity: Severity,
    /// Classifier confidence in [0, 1]
    pub confidence: f64,
}

/// Default confidence when the classifier omits one
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Loose shape of an issue as returned by the classifier.
///
/// Everything is optional; [`Issue::from_raw`] normalizes it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawIssue {
    #[serde(default, alias = "wcagId", alias = "id", alias = "criterion")]
    pub wcag_id: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub element: Option<String>,
    #[serde(default, rename = "howToFix", alias = "how_to_fix", alias = "fix")]
    pub how_to_fix: Option<String>,
    #[serde(default, rename = "whyMatters", alias = "why_matters", alias = "rationale")]
    pub why_matters: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl Issue {
    /// Normalize a classifier issue. The principle is re-derived from the
    /// WCAG id; whatever the model claimed is not trusted.
    pub fn from_raw(raw: RawIssue) -> Self {
        let wcag_id = raw.wcag_id.unwrap_or_default().trim().to_string();
        let severity = raw.severity;
        let icon = raw
            .icon
            .as_deref()
            .and_then(IssueKind::parse)
            .unwrap_or_else(|| IssueKind::for_severity(severity));
        let confidence = raw
            .confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0))
            .unwrap_or(DEFAULT_CONFIDENCE);

        Self {
            principle: crate::scoring::classify(&wcag_id),
            wcag_id,
            icon,
            title: raw.title.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            element: raw.element.filter(|e| !e.trim().is_empty()),
            how_to_fix: raw.how_to_fix.unwrap_or_default(),
            why_matters: raw.why_matters.unwrap_or_default(),
            severity,
            confidence,
        }
    }

    /// Convenience constructor used by tests and offline scoring
    pub fn new(wcag_id: impl Into<String>, severity: Severity, title: impl Into<String>) -> Self {
        Self::from_raw(RawIssue {
            wcag_id: Some(wcag_id.into()),
            title: Some(title.into()),
            severity,
            ..Default::default()
        })
    }
}

/// Coarse conformance grade derived from the overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConformanceLevel {
    AaaEnhanced,
    AaConformant,
    AaPartial,
    APartial,
}

impl ConformanceLevel {
    /// Thresholds are inclusive lower bounds, checked in descending order
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 90 => ConformanceLevel::AaaEnhanced,
            s if s >= 75 => ConformanceLevel::AaConformant,
            s if s >= 55 => ConformanceLevel::AaPartial,
            _ => ConformanceLevel::APartial,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConformanceLevel::AaaEnhanced => "AAA - Enhanced",
            ConformanceLevel::AaConformant => "AA - Conformant",
            ConformanceLevel::AaPartial => "AA - Partially Conformant",
            ConformanceLevel::APartial => "A - Partially Conformant",
        }
    }
}

impl std::fmt::Display for ConformanceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ConformanceLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Output of the scoring engine
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoreSummary {
    pub scores_by_principle: BTreeMap<Principle, u32>,
    pub overall_score: u32,
    pub wcag_level: ConformanceLevel,
    pub total_issues: usize,
    pub critical_count: usize,
    pub major_count: usize,
    pub minor_count: usize,
    pub unclassified_count: usize,
}

impl ScoreSummary {
    pub fn principle_score(&self, principle: Principle) -> u32 {
        self.scores_by_principle.get(&principle).copied().unwrap_or(100)
    }
}

/// Status of one capture attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    Attempting,
    Success,
    Failed,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Attempting => "attempting",
            AttemptStatus::Success => "success",
            AttemptStatus::Failed => "failed",
        }
    }
}

/// One try against one capture backend. Lives only in the step log.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureAttempt {
    pub backend: String,
    pub attempt: u32,
    pub status: AttemptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Local>,
}

/// Run metadata attached to a successful report
#[derive(Debug, Clone, Serialize, Default)]
pub struct ReportMetadata {
    pub model: String,
    pub capture_backend: String,
    pub grounding_sources: Vec<String>,
    pub assessment: String,
    pub extended_analysis: bool,
    pub web_grounding: bool,
    pub analysis_degraded: bool,
}

/// Final output of one pipeline run
///
/// Either `error` is set and `issues`/`summary`/`screenshot_path`/`metadata`
/// are absent, or the reverse. Use [`Report::success`] and
/// [`Report::failure`] to keep it that way.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub url: String,
    pub test_type: String,
    pub timestamp: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<Issue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ScoreSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ReportMetadata>,
}

impl Report {
    pub fn success(
        url: impl Into<String>,
        test_type: impl Into<String>,
        issues: Vec<Issue>,
        summary: ScoreSummary,
        screenshot_path: PathBuf,
        metadata: ReportMetadata,
    ) -> Self {
        Self {
            url: url.into(),
            test_type: test_type.into(),
            timestamp: Local::now(),
            issues: Some(issues),
            summary: Some(summary),
            screenshot_path: Some(screenshot_path),
            error: None,
            metadata: Some(metadata),
        }
    }

    pub fn failure(url: impl Into<String>, test_type: impl Into<String>, error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "Unknown engine failure".to_string();
        }
        Self {
            url: url.into(),
            test_type: test_type.into(),
            timestamp: Local::now(),
            issues: None,
            summary: None,
            screenshot_path: None,
            error: Some(error),
            metadata: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    pub fn overall_score(&self) -> Option<u32> {
        self.summary.as_ref().map(|s| s.overall_score)
    }

    pub fn issue_count(&self) -> usize {
        self.issues.as_ref().map_or(0, Vec::len)
    }
}
