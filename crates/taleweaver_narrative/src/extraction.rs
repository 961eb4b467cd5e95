//! Utilities for extracting structured data from model completions.
//!
//! Completions often wrap JSON in markdown fences, surround it with prose, or stop in the
//! middle of a string because the token budget ran out. [`extract_payload`] runs an
//! ordered pipeline that always produces valid JSON:
//!
//! 1. [`strip_code_fence`]: take the body of the first fence holding an object or array
//! 2. [`find_json_candidate`]: locate the first balanced `{...}` or `[...]`
//! 3. [`repair_json`]: fix trailing commas, ellipses, truncated strings and missing closers
//! 4. parse, else salvage a minimal `{"scene": ...}` object, else [`fallback_payload`]

use regex::Regex;
use serde_json::{Value, json};
use std::sync::LazyLock;

/// Key every narrative payload must carry.
pub const SCENE_KEY: &str = "scene";

/// Scene text used when nothing could be salvaged.
pub const GENERIC_CONTINUATION: &str =
    "The story pauses for a breath. Somewhere ahead, the path continues.";

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("valid regex"));
static ELLIPSIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{3,}").expect("valid regex"));
static SCENE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)"scene"\s*:\s*"((?:[^"\\]|\\.)*)"#).expect("valid regex")
});

/// Turn a raw completion into structured data. Never fails.
///
/// # Examples
///
/// ```
/// use taleweaver_narrative::extract_payload;
///
/// let raw = "Sure!\n```json\n{\"scene\": \"A\", \"choices\": [1, 2,],}\n```";
/// let value = extract_payload(raw);
/// assert_eq!(value, serde_json::json!({"scene": "A", "choices": [1, 2]}));
/// ```
#[tracing::instrument(skip(raw), fields(raw_len = raw.len()))]
pub fn extract_payload(raw: &str) -> Value {
    let text = raw.trim();
    if text.is_empty() {
        tracing::warn!("Empty completion, using fallback payload");
        return fallback_payload();
    }

    let source = strip_code_fence(text).unwrap_or_else(|| text.to_string());

    for candidate in json_candidates(&source) {
        let repaired = repair_json(&candidate);
        match serde_json::from_str::<Value>(&repaired) {
            Ok(value) => {
                if repaired != candidate {
                    tracing::debug!("Parsed completion after repair");
                }
                return value;
            }
            Err(e) => tracing::debug!(error = %e, "Candidate did not parse after repair"),
        }
    }

    if let Some(value) = salvage_scene(text) {
        tracing::warn!("Salvaged minimal scene object from malformed completion");
        return value;
    }

    tracing::warn!(
        preview = %text.chars().take(80).collect::<String>(),
        "No structured data in completion, using fallback payload"
    );
    fallback_payload()
}

/// The minimal valid payload returned when extraction finds nothing.
pub fn fallback_payload() -> Value {
    json!({
        "scene": GENERIC_CONTINUATION,
        "choices": [],
        "mood": "neutral",
        "tension": 5
    })
}

/// Body of the first markdown fence whose content is a JSON object or array.
///
/// The language tag after the opening fence is skipped, and a missing closing fence is
/// treated as truncation: the body then runs to the end of the text.
pub fn strip_code_fence(text: &str) -> Option<String> {
    let mut rest = text;

    while let Some(start) = rest.find("```") {
        let after_ticks = &rest[start + 3..];
        let body_start = after_ticks.find('\n').map(|n| n + 1).unwrap_or(after_ticks.len());
        let (tag, body_and_rest) = after_ticks.split_at(body_start);

        // A tag line that already holds the payload (```{"a":1}```)
        let (body, remainder) = if tag.trim_start().starts_with(['{', '[']) {
            match after_ticks.find("```") {
                Some(end) => (&after_ticks[..end], &after_ticks[end + 3..]),
                None => (after_ticks, ""),
            }
        } else {
            match body_and_rest.find("```") {
                Some(end) => (&body_and_rest[..end], &body_and_rest[end + 3..]),
                None => (body_and_rest, ""),
            }
        };

        let body = body.trim();
        if body.starts_with('{') || body.starts_with('[') {
            return Some(body.to_string());
        }
        rest = remainder;
    }

    None
}

/// The first balanced `{...}` or `[...]` substring.
///
/// The array is preferred when a `[` opens before any `{`. An opener without a matching
/// closer yields the text from the opener to the end, ready for [`repair_json`].
pub fn find_json_candidate(text: &str) -> Option<String> {
    json_candidates(text).into_iter().next()
}

/// Candidates in preference order: the one opening first, then the other kind.
fn json_candidates(text: &str) -> Vec<String> {
    let bracket = text.find('[');
    let brace = text.find('{');

    let order: &[(char, char)] = match (bracket, brace) {
        (Some(b), Some(c)) if b < c => &[('[', ']'), ('{', '}')],
        (Some(_), None) => &[('[', ']')],
        (None, None) => &[],
        _ => &[('{', '}'), ('[', ']')],
    };

    order
        .iter()
        .filter_map(|&(open, close)| extract_balanced(text, open, close))
        .collect()
}

/// Content between balanced delimiters, or from the opener to the end if unbalanced.
fn extract_balanced(text: &str, open: char, close: char) -> Option<String> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if in_string {
            if escape_next {
                escape_next = false;
            } else if ch == '\\' {
                escape_next = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(text[start..start + i + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }

    Some(text[start..].trim_end().to_string())
}

/// Repair common defects in model-produced JSON.
///
/// Text that already parses is returned unchanged, so repairing twice is a no-op.
/// Otherwise, in order: trailing commas before a closer are removed, runs of three or
/// more periods are removed, an unterminated string is closed, a dangling `:` gets an
/// empty string value, a dangling `,` is dropped, and missing closers are appended in
/// nesting order.
///
/// # Examples
///
/// ```
/// use taleweaver_narrative::repair_json;
///
/// assert_eq!(repair_json(r#"{"scene": "The door opens"#), r#"{"scene": "The door opens"}"#);
/// assert_eq!(repair_json(r#"[1, 2,]"#), "[1, 2]");
/// ```
pub fn repair_json(text: &str) -> String {
    if serde_json::from_str::<Value>(text).is_ok() {
        return text.to_string();
    }

    let without_commas = TRAILING_COMMA.replace_all(text.trim(), "$1");
    let mut repaired = ELLIPSIS.replace_all(&without_commas, "").into_owned();

    let mut closers = Vec::new();
    let mut in_string = false;
    let mut escape_next = false;
    for ch in repaired.chars() {
        if in_string {
            if escape_next {
                escape_next = false;
            } else if ch == '\\' {
                escape_next = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => closers.push('}'),
            '[' => closers.push(']'),
            '}' | ']' => {
                closers.pop();
            }
            _ => {}
        }
    }

    if in_string {
        if escape_next {
            repaired.pop();
        }
        repaired.push('"');
    }

    let trimmed_len = repaired.trim_end().len();
    repaired.truncate(trimmed_len);
    if repaired.ends_with(':') {
        repaired.push_str(" \"\"");
    } else if repaired.ends_with(',') {
        repaired.pop();
    }

    while let Some(closer) = closers.pop() {
        repaired.push(closer);
    }

    repaired
}

/// Build `{"scene": ...}` from the first scene field found anywhere in the text.
fn salvage_scene(text: &str) -> Option<Value> {
    let captures = SCENE_FIELD.captures(text)?;
    let scene = captures.get(1)?.as_str().trim_end_matches('\\');
    if scene.trim().is_empty() {
        return None;
    }

    let minimal = repair_json(&format!("{{\"{}\": \"{}\"}}", SCENE_KEY, scene));
    serde_json::from_str(&minimal).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_json_with_trailing_comma() {
        let raw = "```json\n{\"scene\":\"A\",\"choices\":[1,2,],}\n```";
        assert_eq!(extract_payload(raw), json!({"scene": "A", "choices": [1, 2]}));
    }

    #[test]
    fn test_fence_without_language_tag() {
        let raw = "Here you go\n```\n[{\"id\": 1}]\n```\nEnjoy";
        assert_eq!(strip_code_fence(raw).as_deref(), Some("[{\"id\": 1}]"));
    }

    #[test]
    fn test_fence_skips_prose_fences() {
        let raw = "```text\njust words\n```\nthen\n```json\n{\"scene\": \"B\"}\n```";
        assert_eq!(strip_code_fence(raw).as_deref(), Some("{\"scene\": \"B\"}"));
    }

    #[test]
    fn test_unclosed_fence_is_truncation() {
        let raw = "```json\n{\"scene\": \"The bridge sways";
        assert_eq!(
            extract_payload(raw),
            json!({"scene": "The bridge sways"})
        );
    }

    #[test]
    fn test_candidate_prefers_earliest_opener() {
        assert_eq!(
            find_json_candidate("list: [1, {\"a\": 2}] tail").as_deref(),
            Some("[1, {\"a\": 2}]")
        );
        assert_eq!(
            find_json_candidate("obj {\"a\": [1]} tail").as_deref(),
            Some("{\"a\": [1]}")
        );
    }

    #[test]
    fn test_candidate_ignores_brackets_in_strings() {
        assert_eq!(
            find_json_candidate(r#"x {"scene": "a } b [c", "n": 1} y"#).as_deref(),
            Some(r#"{"scene": "a } b [c", "n": 1}"#)
        );
    }

    #[test]
    fn test_unbalanced_candidate_runs_to_end() {
        assert_eq!(
            find_json_candidate("prefix {\"a\": [1, 2").as_deref(),
            Some("{\"a\": [1, 2")
        );
    }

    #[test]
    fn test_repair_steps() {
        assert_eq!(repair_json(r#"{"a": [1, 2"#), r#"{"a": [1, 2]}"#);
        assert_eq!(repair_json(r#"{"a": "x..."#), r#"{"a": "x"}"#);
        assert_eq!(repair_json(r#"{"a":"#), r#"{"a": ""}"#);
        assert_eq!(repair_json(r#"{"a": 1,"#), r#"{"a": 1}"#);
        assert_eq!(repair_json(r#"{"a": "ends in \"#), r#"{"a": "ends in "}"#);
    }

    #[test]
    fn test_repair_is_idempotent() {
        let valid = "{\"scene\": \"ok\",  \"n\": [1,2]}";
        assert_eq!(repair_json(valid), valid);
        assert_eq!(repair_json(&repair_json(valid)), valid);

        let broken = r#"{"scene": "cut off"#;
        let once = repair_json(broken);
        assert_eq!(repair_json(&once), once);
    }

    #[test]
    fn test_salvage_scene_from_garbage() {
        let raw = r#"{"scene": "The lantern gutters", "choices": [{"id": 1 "text" oops}"#;
        let value = extract_payload(raw);
        assert_eq!(value["scene"], "The lantern gutters");
    }

    #[test]
    fn test_totality() {
        for raw in ["", "   ", "no json here", "{{{{", "]]", "```", "\"unterminated"] {
            let value = extract_payload(raw);
            assert!(value.is_object() || value.is_array(), "input {raw:?}");
        }
        assert_eq!(extract_payload("plain prose"), fallback_payload());
    }

    #[test]
    fn test_valid_array_passes_through() {
        let raw = r#"[{"id":1,"text":"Go"},{"id":2,"text":"Stay"}]"#;
        assert_eq!(extract_payload(raw).as_array().map(Vec::len), Some(2));
    }
}
