//! Best-effort recovery of a single JSON object from free-form model output.

use serde_json::{Map, Value};

/// Slices from the first `{` to the last `}` and parses that strictly.
///
/// Returns `None` when there is no such span, the span does not parse, or it
/// parses to something other than an object. Never fails otherwise: a missing
/// object is an expected outcome the caller handles with a retry.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
