//! Structured output decoding
//!
//! Models frequently wrap JSON answers in Markdown code fences. Every
//! structured call goes through `decode_json`, which strips the fences and
//! then requires the payload to deserialize into the expected type. Anything
//! else is a `Parse` error; callers degrade to a clarification reply instead
//! of retrying.

use serde::de::DeserializeOwned;

use crate::LlmError;

/// Decode a model response into `T`, tolerating code-fence wrapping.
pub fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, LlmError> {
    let stripped = strip_fences(raw);
    if stripped.is_empty() {
        return Err(LlmError::Parse("empty response".to_string()));
    }
    serde_json::from_str(stripped).map_err(|e| LlmError::Parse(e.to_string()))
}

/// Remove a leading ```json / ``` fence pair if present.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end_matches('`').trim()
}
