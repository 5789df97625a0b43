//! Normalization of raw model output into parseable JSON.
//!
//! Models asked for "raw JSON only" still wrap their answer in markdown
//! fences, prepend a sentence of prose, or leave stray backticks behind.
//! `sanitize` strips exactly those wrappers and nothing else; anything that
//! still fails to parse afterwards is a typed error, never a panic.

use serde::de::DeserializeOwned;

use crate::error::AssessmentError;

const FENCE: &str = "```";

/// Language tags recognised directly after an opening fence.
pub const KNOWN_FENCE_TAGS: &[&str] = &["json", "json5", "jsonc", "javascript", "js", "text"];

/// Strip delimiter fences, stray backticks, and surrounding prose.
///
/// Idempotent for input containing at most one fenced block.
pub fn sanitize(raw: &str) -> String {
    let mut text = raw.trim();

    let starts_like_json = text.starts_with('{') || text.starts_with('[');
    if text.contains(FENCE) && (text.starts_with(FENCE) || !starts_like_json) {
        if let Some(inner) = fenced_body(text) {
            text = inner;
        }
    }

    let text = text.trim_matches(|c: char| c == '`' || c.is_whitespace());
    trim_to_json(text).to_string()
}

/// Content between the first opening fence and the last closing fence.
/// An unclosed fence (truncated output) yields everything after it.
fn fenced_body(text: &str) -> Option<&str> {
    let open = text.find(FENCE)?;
    let after_fence = &text[open + FENCE.len()..];

    let tag_len = after_fence
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after_fence.len());
    let tag = after_fence[..tag_len].to_ascii_lowercase();
    let body = if KNOWN_FENCE_TAGS.contains(&tag.as_str()) {
        &after_fence[tag_len..]
    } else {
        after_fence
    };

    let body = match body.rfind(FENCE) {
        Some(close) => &body[..close],
        None => body,
    };
    Some(body.trim())
}

/// Drop prose before the first `{`/`[` and after the last `}`/`]`.
fn trim_to_json(text: &str) -> &str {
    if text.starts_with('{') || text.starts_with('[') {
        return text;
    }
    let start = text.find(['{', '[']);
    let end = text.rfind(['}', ']']);
    match (start, end) {
        (Some(s), Some(e)) if s < e => &text[s..=e],
        _ => text,
    }
}

/// Sanitize `raw` and deserialize it.
///
/// Text that is not JSON after sanitizing is `MalformedResponse`; JSON of
/// the wrong shape is `SchemaViolation`.
pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> Result<T, AssessmentError> {
    let cleaned = sanitize(raw);
    let value: serde_json::Value = serde_json::from_str(&cleaned)
        .map_err(|e| AssessmentError::malformed(e.to_string(), &cleaned))?;
    serde_json::from_value(value).map_err(|e| AssessmentError::SchemaViolation(e.to_string()))
}
