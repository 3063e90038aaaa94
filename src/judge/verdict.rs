//! Parsing of the judge's raw reply into a structured verdict.

use crate::error::GenerationError;
use crate::types::{ContentCategory, RelevanceScore};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A judge decision, before it is checked against the supplied results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub selected: ContentCategory,
    pub reasoning: String,
    /// Judge-assigned scores, clamped to `0..=100`. Unknown categories are dropped.
    pub scores: BTreeMap<ContentCategory, u8>,
}

/// Strip an optional fenced code block (```json ... ``` or ``` ... ```) around a reply.
///
/// Returns the trimmed input when no complete fence is present.
pub fn extract_json_block(reply: &str) -> &str {
    let trimmed = reply.trim();
    let (marker, skip) = if let Some(pos) = trimmed.find("```json") {
        (pos, "```json".len())
    } else if let Some(pos) = trimmed.find("```") {
        (pos, "```".len())
    } else {
        return trimmed;
    };
    let body = &trimmed[marker + skip..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => trimmed,
    }
}

/// Parse a JSON object reply, optionally fenced.
pub fn parse_json_object(reply: &str) -> Result<Map<String, Value>, GenerationError> {
    let block = extract_json_block(reply);
    match serde_json::from_str::<Value>(block) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(GenerationError::Malformed(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(GenerationError::Malformed(format!("invalid JSON: {}", e))),
    }
}

/// Parse `{"selected": ..., "reasoning": ..., "scores": {...}}`.
pub fn parse_verdict(reply: &str) -> Result<Verdict, GenerationError> {
    let object = parse_json_object(reply)?;

    let selected = required_text(&object, "selected")?;
    let selected: ContentCategory = selected.parse()?;
    let reasoning = required_text(&object, "reasoning")?.to_string();

    let mut scores = BTreeMap::new();
    if let Some(Value::Object(raw)) = object.get("scores") {
        for (key, value) in raw {
            let Ok(category) = key.parse::<ContentCategory>() else {
                continue;
            };
            if let Some(score) = numeric_score(value) {
                scores.insert(category, RelevanceScore::clamped(score).get());
            }
        }
    }

    Ok(Verdict {
        selected,
        reasoning,
        scores,
    })
}

fn required_text<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a str, GenerationError> {
    match object.get(key) {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.trim()),
        Some(_) => Err(GenerationError::Malformed(format!(
            "field '{}' must be a non-empty string",
            key
        ))),
        None => Err(GenerationError::Malformed(format!(
            "missing required field '{}'",
            key
        ))),
    }
}

fn numeric_score(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
