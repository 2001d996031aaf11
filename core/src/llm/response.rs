// 外部推理服务的自由文本响应清洗与校验
// 服务不一定遵守"不要 markdown"的指示，剥离围栏是必要步骤

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::scanner::{Finding, Severity};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),

    #[error("Missing or empty field: {0}")]
    EmptyField(&'static str),

    #[error("Invalid line number: must be a positive integer")]
    InvalidLine,
}

/// 服务端约定的原始记录，字段名区分大小写
#[derive(Debug, Deserialize)]
struct RawCreativeFinding {
    #[serde(rename = "type")]
    kind: Option<String>,
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    line: Option<serde_json::Value>,
    suggestion: Option<String>,
}

/// 从响应文本中抠出一个 JSON 对象
///
/// 依次尝试：裸对象、markdown 围栏、文本中内嵌的最外层 {..}。
pub fn extract_json_from_response(response: &str) -> Result<String, ParseError> {
    let trimmed = response.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Ok(trimmed.to_string());
    }

    if trimmed.contains("```") {
        return extract_from_markdown_block(trimmed);
    }

    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            if start < end {
                return Ok(trimmed[start..=end].to_string());
            }
        }
    }

    Err(ParseError::InvalidJson(
        "No JSON object found in response".to_string(),
    ))
}

fn extract_from_markdown_block(text: &str) -> Result<String, ParseError> {
    let re = Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)\n?```").unwrap();

    if let Some(captures) = re.captures(text) {
        if let Some(json_match) = captures.get(1) {
            let json = json_match.as_str().trim();
            if json.starts_with('{') && json.ends_with('}') {
                return Ok(json.to_string());
            }
        }
    }

    Err(ParseError::InvalidJson(
        "Could not extract JSON from markdown block".to_string(),
    ))
}

/// 清洗、解析并校验一条创造性发现
///
/// severity 必须落在四档内，title/description/suggestion 非空，
/// line 若出现必须是正整数。任何违反都拒绝整条记录。
pub fn parse_creative_finding(response: &str) -> Result<Finding, ParseError> {
    let json_str = extract_json_from_response(response)?;

    let raw: RawCreativeFinding = serde_json::from_str(&json_str).map_err(|e| {
        ParseError::InvalidJson(format!(
            "{}: {}",
            e,
            json_str.chars().take(100).collect::<String>()
        ))
    })?;

    let kind = raw.kind.unwrap_or_default();
    if kind.trim().is_empty() {
        return Err(ParseError::EmptyField("type"));
    }
    let severity = Severity::parse(&kind).ok_or(ParseError::UnknownSeverity(kind))?;

    let title = non_empty(raw.title, "title")?;
    let description = non_empty(raw.description, "description")?;
    let suggestion = non_empty(raw.suggestion, "suggestion")?;

    let line = match raw.line {
        None | Some(serde_json::Value::Null) => None,
        Some(value) => match value.as_u64() {
            Some(n) if n >= 1 => Some(n as usize),
            _ => return Err(ParseError::InvalidLine),
        },
    };

    Ok(Finding {
        severity,
        title,
        description,
        line,
        suggestion,
    })
}

fn non_empty(value: Option<String>, field: &'static str) -> Result<String, ParseError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ParseError::EmptyField(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "type": "high",
        "title": "Race Condition in Cache Refresh",
        "description": "Two workers can refresh the same key concurrently",
        "line": 12,
        "suggestion": "Guard the refresh with a per-key lock"
    }"#;

    #[test]
    fn test_parse_valid_record() {
        let finding = parse_creative_finding(VALID).unwrap();
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.title, "Race Condition in Cache Refresh");
        assert_eq!(finding.line, Some(12));
    }

    #[test]
    fn test_parse_record_without_line() {
        let response = r#"{"type": "low", "title": "t", "description": "d", "suggestion": "s"}"#;
        let finding = parse_creative_finding(response).unwrap();
        assert_eq!(finding.line, None);
    }

    #[test]
    fn test_parse_record_with_null_line() {
        let response =
            r#"{"type": "low", "title": "t", "description": "d", "line": null, "suggestion": "s"}"#;
        let finding = parse_creative_finding(response).unwrap();
        assert_eq!(finding.line, None);
    }

    #[test]
    fn test_extract_plain_object() {
        let json = extract_json_from_response(r#"{"key": "value"}"#).unwrap();
        assert_eq!(json, r#"{"key": "value"}"#);
    }

    #[test]
    fn test_extract_from_fenced_block() {
        let response = "```json\n{\"type\": \"low\"}\n```";
        let json = extract_json_from_response(response).unwrap();
        assert_eq!(json, "{\"type\": \"low\"}");
    }

    #[test]
    fn test_extract_from_fence_without_language_tag() {
        let response = "```\n{\"type\": \"low\"}\n```";
        let json = extract_json_from_response(response).unwrap();
        assert_eq!(json, "{\"type\": \"low\"}");
    }

    #[test]
    fn test_extract_embedded_object() {
        let response = r#"Here is the finding: {"type": "low"} as requested."#;
        let json = extract_json_from_response(response).unwrap();
        assert_eq!(json, r#"{"type": "low"}"#);
    }

    #[test]
    fn test_extract_rejects_plain_prose() {
        assert!(extract_json_from_response("no structured data here").is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_severity() {
        let response = r#"{"type": "catastrophic", "title": "t", "description": "d", "suggestion": "s"}"#;
        assert!(matches!(
            parse_creative_finding(response),
            Err(ParseError::UnknownSeverity(_))
        ));
    }

    #[test]
    fn test_parse_rejects_missing_type() {
        let response = r#"{"title": "t", "description": "d", "suggestion": "s"}"#;
        assert!(matches!(
            parse_creative_finding(response),
            Err(ParseError::EmptyField("type"))
        ));
    }

    #[test]
    fn test_parse_rejects_blank_title() {
        let response = r#"{"type": "low", "title": "  ", "description": "d", "suggestion": "s"}"#;
        assert!(matches!(
            parse_creative_finding(response),
            Err(ParseError::EmptyField("title"))
        ));
    }

    #[test]
    fn test_parse_rejects_non_numeric_line() {
        let response =
            r#"{"type": "low", "title": "t", "description": "d", "line": "twelve", "suggestion": "s"}"#;
        assert!(matches!(
            parse_creative_finding(response),
            Err(ParseError::InvalidLine)
        ));
    }

    #[test]
    fn test_parse_rejects_zero_line() {
        let response =
            r#"{"type": "low", "title": "t", "description": "d", "line": 0, "suggestion": "s"}"#;
        assert!(matches!(
            parse_creative_finding(response),
            Err(ParseError::InvalidLine)
        ));
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(matches!(
            parse_creative_finding("{not json"),
            Err(ParseError::InvalidJson(_))
        ));
    }
}
