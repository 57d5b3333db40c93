//! Structured-data extraction from free-form model output.
//!
//! Models wrap their JSON in prose, markdown fences, or trailing commentary.
//! A cascade of strategies recovers the object; an all-miss is a recoverable
//! outcome the orchestrator can repair with a corrective retry, not an error.

use pulse_common::{AnalysisResponse, Confidence};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

/// Fenced code block, tagged ```json or untagged
static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap());

/// Permissive fallback: a brace pair with at most one level of nesting
static LOOSE_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}").unwrap());

/// Outcome of an extraction attempt.
///
/// Modeled as a tagged value rather than an error so the repair loop is a
/// plain branch on outcome kind.
#[derive(Debug)]
pub enum Extraction {
    /// A JSON object was recovered.
    Extracted(Value),
    /// No strategy found parseable JSON. Recoverable via a repair retry.
    NoJson,
}

/// Attempt to recover a JSON object from raw model text.
///
/// Strategies, first success wins:
/// 1. parse the whole trimmed text,
/// 2. parse the contents of a fenced code block,
/// 3. brace-depth match from the first `{`,
/// 4. permissive regex over one level of nested braces.
pub fn extract_json(text: &str) -> Extraction {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        if value.is_object() {
            return Extraction::Extracted(value);
        }
    }

    if let Some(caps) = FENCED_BLOCK.captures(text) {
        if let Ok(value) = serde_json::from_str::<Value>(&caps[1]) {
            return Extraction::Extracted(value);
        }
    }

    if let Some(value) = balanced_braces(text) {
        return Extraction::Extracted(value);
    }

    if let Some(m) = LOOSE_OBJECT.find(text) {
        if let Ok(value) = serde_json::from_str::<Value>(m.as_str()) {
            return Extraction::Extracted(value);
        }
    }

    debug!(
        "No JSON recovered from model output: {:?}...",
        text.chars().take(300).collect::<String>()
    );
    Extraction::NoJson
}

/// Strategy 3: find the first `{` and its balanced closing `}`.
fn balanced_braces(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let mut depth = 0usize;

    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &text[start..start + offset + ch.len_utf8()];
                    return serde_json::from_str::<Value>(candidate).ok();
                }
            }
            _ => {}
        }
    }

    None
}

/// Assemble the final response from an extracted object.
///
/// Every field is optional-safe: a malformed-but-parseable object never
/// escalates to a failure. The model's own confidence claim, if any, is
/// discarded in favor of the preprocessor's volume-based value, and the
/// sentiment score is clamped to `[0, 1]` whatever the model emitted.
/// `processing_time_ms` is a placeholder the orchestrator overwrites.
pub fn assemble_response(
    parsed: &Value,
    confidence: Confidence,
    session_id: &str,
) -> AnalysisResponse {
    let sentiment = parsed
        .get("sentiment_score")
        .and_then(Value::as_f64)
        .unwrap_or(0.5)
        .clamp(0.0, 1.0);

    AnalysisResponse {
        session_id: session_id.to_string(),
        sentiment_score: sentiment,
        themes: string_list(parsed.get("themes"))
            .unwrap_or_else(|| vec!["general".to_string()]),
        strengths: string_list(parsed.get("strengths")).unwrap_or_default(),
        improvements: string_list(parsed.get("improvements")).unwrap_or_default(),
        summary: parsed
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or("Analysis completed.")
            .to_string(),
        confidence,
        processing_time_ms: 0,
    }
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value.and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(|item| item.as_str().map(|s| s.to_string()))
            .collect()
    })
}
