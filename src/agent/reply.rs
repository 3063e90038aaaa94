//! Parsing of content-agent replies into [`ContentResult`]s.

use super::prompts::{spec_for, FieldDefault};
use crate::error::GenerationError;
use crate::judge::parse_json_object;
use crate::types::{ContentCategory, ContentResult, RelevanceScore};
use serde_json::Value;

/// Relevance assumed when the model does not report one
const DEFAULT_RELEVANCE: i64 = 50;

pub(crate) fn parse_content(
    category: ContentCategory,
    location_name: &str,
    reply: &str,
) -> Result<ContentResult, GenerationError> {
    let spec = spec_for(category);
    let object = parse_json_object(reply)?;
    let record = match object.get(spec.key) {
        Some(Value::Object(record)) => record,
        Some(_) => {
            return Err(GenerationError::Malformed(format!(
                "field '{}' must be an object",
                spec.key
            )))
        }
        None => {
            return Err(GenerationError::Malformed(format!(
                "response missing '{}' field",
                spec.key
            )))
        }
    };

    let title = match record.get("title") {
        Some(Value::String(title)) if !title.trim().is_empty() => title.trim().to_string(),
        _ => {
            return Err(GenerationError::Malformed(format!(
                "'{}' is missing a title",
                spec.key
            )))
        }
    };
    let description = record
        .get(spec.description_field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let relevance = match record.get("relevance_score") {
        None | Some(Value::Null) => DEFAULT_RELEVANCE,
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .ok_or_else(|| GenerationError::Malformed(format!("bad relevance_score {}", n)))?,
        Some(other) => {
            return Err(GenerationError::Malformed(format!(
                "relevance_score must be a number, got {}",
                other
            )))
        }
    };
    let relevance = RelevanceScore::new(relevance)?;

    let mut result = ContentResult::new(category, location_name, title, description, relevance);
    for (field, default) in spec.metadata {
        let value = record.get(*field).cloned().unwrap_or_else(|| match default {
            FieldDefault::Text(text) => Value::String(text.to_string()),
            FieldDefault::List => Value::Array(Vec::new()),
        });
        result = result.with_metadata(*field, value);
    }
    Ok(result)
}
