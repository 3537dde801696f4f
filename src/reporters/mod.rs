//! Output reporters for scan results
//!
//! - `json` - the framed stdout block a parent process scrapes
//! - `live` - fixed-shape file for the presentation front end
//! - `proof` - batch run summary across several sites

mod json;
mod live;
mod proof;

pub use json::{error_block, extract_block, render_block, JSON_END, JSON_START};
pub use live::{LiveReport, LiveSummary, LIVE_TOTAL_CHECKS};
pub use proof::{BatchProof, SiteResult};

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Write `value` as pretty JSON, creating parent directories
pub fn write_pretty<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Issue, Report, ReportMetadata, Severity};
    use std::path::PathBuf;

    /// A successful report with one critical and one major issue
    pub(crate) fn test_report() -> Report {
        let issues = vec![
            Issue::new("1.1.1", Severity::Critical, "Missing alt text"),
            Issue::new("2.4.7", Severity::Major, "No focus indicator"),
        ];
        let summary = crate::scoring::score(&issues);
        Report::success(
            "https://example.com",
            "WCAG Accessibility Scan",
            issues,
            summary,
            PathBuf::from("agent_screenshots/audit_1.png"),
            ReportMetadata {
                model: "amazon.nova-pro-v1:0".into(),
                capture_backend: "headless_chrome".into(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_write_pretty_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("web/public/live_report.json");
        write_pretty(&serde_json::json!({"ok": true}), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains('\n'));
        assert!(content.contains("\"ok\": true"));
    }
}
