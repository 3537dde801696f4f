//! Framed JSON reporter
//!
//! Stdout carries exactly one compact JSON document between two marker
//! lines so a parent process can find it among any other output.

use anyhow::Result;
use serde::Serialize;

pub const JSON_START: &str = "---JSON_START---";
pub const JSON_END: &str = "---JSON_END---";

/// Render `value` between the markers (compact, single line)
pub fn render_block<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(frame(&json))
}

/// Minimal block printed when the real report can't be serialized
pub fn error_block(url: &str, error: &str) -> String {
    let value = serde_json::json!({
        "error": format!("Serialization Error: {}", error),
        "url": url,
    });
    frame(&value.to_string())
}

/// Pull the JSON text back out of captured stdout
pub fn extract_block(stdout: &str) -> Option<&str> {
    let start = stdout.find(JSON_START)? + JSON_START.len();
    let end = start + stdout[start..].find(JSON_END)?;
    Some(stdout[start..end].trim())
}

fn frame(json: &str) -> String {
    format!("{}\n{}\n{}", JSON_START, json, JSON_END)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Report;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_block_framing() {
        let block = render_block(&test_report()).unwrap();
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], JSON_START);
        assert_eq!(lines[2], JSON_END);

        let parsed: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed["url"], "https://example.com");
        assert_eq!(parsed["summary"]["overall_score"], 92);
        assert_eq!(parsed["issues"][0]["howToFix"], "");
        assert!(parsed.get("error").is_none());
    }

    #[test]
    fn test_failure_report_shape() {
        let report = Report::failure("https://example.com", "WCAG Accessibility Scan", "boom");
        let block = render_block(&report).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(extract_block(&block).unwrap()).unwrap();
        assert_eq!(parsed["error"], "boom");
        assert!(parsed.get("issues").is_none());
        assert!(parsed.get("screenshot_path").is_none());
        assert!(parsed.get("summary").is_none());
    }

    #[test]
    fn test_error_block() {
        let block = error_block("https://example.com", "key must be a string");
        let parsed: serde_json::Value = serde_json::from_str(extract_block(&block).unwrap()).unwrap();
        assert_eq!(parsed["error"], "Serialization Error: key must be a string");
        assert_eq!(parsed["url"], "https://example.com");
    }

    #[test]
    fn test_extract_block_ignores_noise() {
        let stdout = "loading...\n---JSON_START---\n{\"a\":1}\n---JSON_END---\ntrailing";
        assert_eq!(extract_block(stdout), Some("{\"a\":1}"));
        assert_eq!(extract_block("no markers here"), None);
    }
}
