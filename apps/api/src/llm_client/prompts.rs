// Shared prompt constants and prompt-building utilities.
// Each generator defines its own prompts alongside it.
// This file contains cross-cutting prompt fragments.

/// Directive appended to every generation system prompt.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Prefixed to the user prompt on the single strict retry after an unparseable answer.
pub const STRICT_JSON_RETRY: &str = "Your previous answer could not be parsed. \
    Respond with JSON ONLY: exactly one JSON object, starting with '{' and ending with '}', \
    with no prose, no explanations and no code fences.";

/// Behavioral rules shared by every generator.
pub const NUMERIC_NULL_RULE: &str =
    "Use null for any numeric value you do not know; never invent units inside numbers.";

/// Joins a strict directive onto an existing user prompt.
pub fn strict_retry_prompt(user: &str) -> String {
    format!("{STRICT_JSON_RETRY}\n\n{user}")
}
