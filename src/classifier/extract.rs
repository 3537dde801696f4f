//! JSON extraction from free-form model output
//!
//! Models wrap their JSON in prose or code fences often enough that the
//! reply can't be parsed directly. [`extract_json`] tries, in order:
//!
//! 1. The first balanced object or array (string and escape aware), when
//!    it can carry issues: an object, or a non-empty array of objects
//! 2. The span between the first `{` and the last `}`
//! 3. The balanced object at the first `{`
//!
//! A prose fragment like `[2]` only wins when nothing else parses.

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ExtractError {
    #[error("no JSON object or array found in model output")]
    NotFound,

    #[error("invalid JSON in model output: {0}")]
    Invalid(String),
}

/// Extract and parse the JSON value embedded in `text`
pub fn extract_json(text: &str) -> Result<Value, ExtractError> {
    let Some(start) = text.find(['{', '[']) else {
        return Err(ExtractError::NotFound);
    };

    let mut last_error = None;
    let mut stray = None;

    if let Some(end) = balanced_end(text, start) {
        match serde_json::from_str::<Value>(&text[start..=end]) {
            Ok(value) if carries_payload(&value) => return Ok(value),
            Ok(value) => stray = Some(value),
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    if let Some(open) = text.find('{') {
        if let Some(close) = text.rfind('}').filter(|&close| close > open) {
            match serde_json::from_str(&text[open..=close]) {
                Ok(value) => return Ok(value),
                Err(e) => last_error = Some(e.to_string()),
            }
        }

        if open != start {
            if let Some(end) = balanced_end(text, open) {
                match serde_json::from_str(&text[open..=end]) {
                    Ok(value) => return Ok(value),
                    Err(e) => last_error = Some(e.to_string()),
                }
            }
        }
    }

    if let Some(value) = stray {
        return Ok(value);
    }

    match last_error {
        Some(e) => Err(ExtractError::Invalid(e)),
        None if text.contains('{') => Err(ExtractError::Invalid("unbalanced braces".to_string())),
        None => Err(ExtractError::NotFound),
    }
}

fn carries_payload(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_object),
        _ => false,
    }
}

/// Byte index of the bracket closing the one at `start`
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'}' | b']' => {
                if stack.pop() != Some(*byte) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object() {
        let v = extract_json(r#"{"issues": []}"#).unwrap();
        assert!(v["issues"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_object_in_code_fence() {
        let text = "Here is the audit:\n```json\n{\"issues\": [{\"title\": \"a}b\"}]}\n```\nLet me know!";
        let v = extract_json(text).unwrap();
        assert_eq!(v["issues"][0]["title"], "a}b");
    }

    #[test]
    fn test_bare_array() {
        let v = extract_json("Result: [{\"title\": \"x\"}] done").unwrap();
        assert!(v.is_array());
    }

    #[test]
    fn test_stops_at_first_balanced_value() {
        let v = extract_json(r#"{"a": 1} and later {"b": 2}"#).unwrap();
        assert_eq!(v["a"], 1);
        assert!(v.get("b").is_none());
    }

    #[test]
    fn test_escaped_quotes_in_strings() {
        let v = extract_json(r#"{"t": "say \"{hi\""}"#).unwrap();
        assert_eq!(v["t"], "say \"{hi\"");
    }

    #[test]
    fn test_no_json() {
        assert_eq!(extract_json("I could not analyze this image."), Err(ExtractError::NotFound));
        assert_eq!(extract_json(""), Err(ExtractError::NotFound));
    }

    #[test]
    fn test_truncated_json() {
        let err = extract_json(r#"{"issues": [{"title": "cut off"#).unwrap_err();
        assert!(matches!(err, ExtractError::Invalid(_)));
    }

    #[test]
    fn test_prose_brackets_before_object() {
        let text = "I found [2] issues:\n{\"issues\": [{\"wcag_id\": \"1.1.1\"}, {\"wcag_id\": \"2.4.7\"}]}";
        let v = extract_json(text).unwrap();
        assert_eq!(v["issues"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_unclosed_bracket_falls_back_to_brace_span() {
        // The scan from `[` never closes; the first-`{`..last-`}` span does parse
        let text = "Notes [draft: {\"issues\": [{\"wcag_id\": \"1.4.3\"}], \"overall_assessment\": \"ok\"}";
        let v = extract_json(text).unwrap();
        assert_eq!(v["issues"][0]["wcag_id"], "1.4.3");
        assert_eq!(v["overall_assessment"], "ok");
    }

    #[test]
    fn test_balanced_object_when_brace_span_is_invalid() {
        let v = extract_json(r#"See [1]: {"a": 1} and later {"b": 2}"#).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn test_scalar_array_used_when_nothing_else_parses() {
        assert_eq!(extract_json("Found [] issues").unwrap(), serde_json::json!([]));
        assert_eq!(extract_json("Scores [1, 2] only").unwrap(), serde_json::json!([1, 2]));
    }

    #[test]
    fn test_invalid_json_reports_parse_error() {
        let err = extract_json("{issues: nope}").unwrap_err();
        assert!(matches!(err, ExtractError::Invalid(_)));
    }
}
