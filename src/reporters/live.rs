//! Live report file for the presentation front end

use crate::models::{Issue, Report};
use chrono::{DateTime, Local};
use serde::Serialize;

/// Fixed number of checks the front end displays
pub const LIVE_TOTAL_CHECKS: usize = 25;

#[derive(Debug, Clone, Serialize)]
pub struct LiveSummary {
    pub passed: usize,
    pub total: usize,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiveReport {
    pub url: String,
    pub timestamp: DateTime<Local>,
    pub summary: LiveSummary,
    pub issues: Vec<Issue>,
}

impl LiveReport {
    pub fn from_report(report: &Report) -> Self {
        let issues = report.issues.clone().unwrap_or_default();
        Self {
            url: report.url.clone(),
            timestamp: report.timestamp,
            summary: LiveSummary {
                passed: LIVE_TOTAL_CHECKS.saturating_sub(issues.len()),
                total: LIVE_TOTAL_CHECKS,
                score: report.overall_score().unwrap_or(0),
            },
            issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use crate::reporters::tests::test_report;
    use crate::reporters::write_pretty;

    #[test]
    fn test_from_success() {
        let live = LiveReport::from_report(&test_report());
        assert_eq!(live.summary.passed, 23);
        assert_eq!(live.summary.total, 25);
        assert_eq!(live.summary.score, 92);
        assert_eq!(live.issues.len(), 2);
    }

    #[test]
    fn test_passed_floors_at_zero() {
        let issues: Vec<Issue> = (0..30)
            .map(|i| Issue::new("1.4.3", Severity::Minor, format!("Contrast {}", i)))
            .collect();
        let mut report = test_report();
        report.summary = Some(crate::scoring::score(&issues));
        report.issues = Some(issues);
        assert_eq!(LiveReport::from_report(&report).summary.passed, 0);
    }

    #[test]
    fn test_from_failure() {
        let report = Report::failure("https://example.com", "scan", "no screenshot");
        let live = LiveReport::from_report(&report);
        assert_eq!(live.summary.score, 0);
        assert_eq!(live.summary.passed, 25);
        assert!(live.issues.is_empty());
    }

    #[test]
    fn test_written_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live_report.json");
        write_pretty(&LiveReport::from_report(&test_report()), &path).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["summary"]["total"], 25);
        assert_eq!(parsed["issues"][0]["title"], "Missing alt text");
        assert!(parsed["timestamp"].is_string());
    }
}
