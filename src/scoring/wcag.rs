//! Principle classification and score calculation

use crate::models::{ConformanceLevel, Issue, Principle, ScoreSummary, Severity};
use std::collections::BTreeMap;
use tracing::debug;

/// Success criteria prefixes recognised for each principle, in match order
pub const PRINCIPLE_CRITERIA: [(Principle, &[&str]); 4] = [
    (
        Principle::Perceivable,
        &["1.1.1", "1.2.1", "1.2.2", "1.3.1", "1.3.2", "1.4.1", "1.4.3", "1.4.4", "1.4.11"],
    ),
    (
        Principle::Operable,
        &["2.1.1", "2.1.2", "2.2.1", "2.2.2", "2.3.1", "2.4.1", "2.4.2", "2.4.3", "2.4.4", "2.4.7"],
    ),
    (
        Principle::Understandable,
        &["3.1.1", "3.1.2", "3.2.1", "3.2.2", "3.3.1", "3.3.2", "3.3.3", "3.3.4"],
    ),
    (Principle::Robust, &["4.1.1", "4.1.2", "4.1.3"]),
];

/// First principle whose criteria list has a prefix of `wcag_id`.
///
/// Plain string prefix match, so "1.4.11" is Perceivable through "1.4.1"
/// already, and "1.4.3a" still counts as 1.4.3.
pub fn classify(wcag_id: &str) -> Option<Principle> {
    if wcag_id.is_empty() {
        return None;
    }
    PRINCIPLE_CRITERIA
        .iter()
        .find(|(_, codes)| codes.iter().any(|code| wcag_id.starts_with(code)))
        .map(|(principle, _)| *principle)
}

/// Score a set of issues.
///
/// An empty slice is a legitimate clean result: every principle 100,
/// overall 100, "AAA - Enhanced".
pub fn score(issues: &[Issue]) -> ScoreSummary {
    let mut deductions: BTreeMap<Principle, u32> =
        Principle::ALL.iter().map(|p| (*p, 0)).collect();
    let mut unclassified_count = 0;
    let mut critical_count = 0;
    let mut major_count = 0;
    let mut minor_count = 0;

    for issue in issues {
        match issue.severity {
            Severity::Critical => critical_count += 1,
            Severity::Major => major_count += 1,
            Severity::Minor => minor_count += 1,
            Severity::Info => {}
        }

        match classify(&issue.wcag_id) {
            Some(principle) => {
                *deductions.entry(principle).or_insert(0) += issue.severity.deduction();
            }
            None => unclassified_count += 1,
        }
    }

    let scores_by_principle: BTreeMap<Principle, u32> = deductions
        .into_iter()
        .map(|(p, deduction)| (p, 100u32.saturating_sub(deduction)))
        .collect();

    // Fixed denominator: always the four principles, never the issue count
    let overall_score = scores_by_principle.values().sum::<u32>() / Principle::ALL.len() as u32;
    let wcag_level = ConformanceLevel::from_score(overall_score);

    debug!(
        "Scored {} issues: overall={} level={} unclassified={}",
        issues.len(),
        overall_score,
        wcag_level,
        unclassified_count
    );

    ScoreSummary {
        scores_by_principle,
        overall_score,
        wcag_level,
        total_issues: issues.len(),
        critical_count,
        major_count,
        minor_count,
        unclassified_count,
    }
}
