//! Parsing of the vision model's JSON verdict.

use idguard_core::ExtractionError;
use serde_json::{Map, Value};

/// What the model decided about the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// All checks passed; the extracted label → value map.
    Success(Map<String, Value>),
    /// The model refused the document (`potential_fraud`, `image_quality_failure`).
    Rejected { status: String, reason: String },
}

/// Remove a surrounding Markdown code fence and any prose around the JSON object.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```JSON"))
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed)
        .trim();

    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced,
    }
}

/// Interpret the model's raw answer.
pub fn parse_verdict(raw: &str) -> Result<Verdict, ExtractionError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(ExtractionError::Malformed("empty model response".to_string()));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExtractionError::Malformed(format!("{e}: {}", truncate(body, 200))))?;
    let Value::Object(mut obj) = value else {
        return Err(ExtractionError::Malformed("response is not a JSON object".to_string()));
    };

    let status = obj
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_ascii_lowercase();

    match status.as_str() {
        "success" => match obj.remove("data") {
            Some(Value::Object(data)) => Ok(Verdict::Success(data)),
            Some(_) => Err(ExtractionError::Malformed("`data` is not an object".to_string())),
            None => {
                // Some models inline the fields next to `status`.
                obj.remove("status");
                Ok(Verdict::Success(obj))
            }
        },
        "potential_fraud" | "image_quality_failure" => {
            let reason = obj
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or("no reason given")
                .to_string();
            Ok(Verdict::Rejected { status, reason })
        }
        "error" => {
            let message = obj
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("model reported an error")
                .to_string();
            Err(ExtractionError::Provider(message))
        }
        "" => Err(ExtractionError::Malformed("missing `status` field".to_string())),
        other => Err(ExtractionError::Malformed(format!("unknown status `{other}`"))),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
