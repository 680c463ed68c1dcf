//! Structured-Output Recovery
//!
//! Turns arbitrary model text into a validated JSON object or a well-defined
//! empty result. Providers wrap JSON in markdown fences, commentary, or
//! trailing explanation often enough that a single parse call is not
//! acceptable for an unattended pipeline; this module layers extraction
//! strategies from cheapest to most forgiving and stops at the first that
//! yields a well-formed object.
//!
//! This is the only place in the codebase that interprets raw model text.
//! Every agent and the orchestrator call `recover` and treat an empty map as
//! "no data", never as an error to escalate.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Recover a JSON object from free-text model output.
///
/// Never fails: on total recovery failure the result is an empty map and the
/// `context_label` is logged for diagnosis. Calling twice on the same text
/// yields the same result.
pub fn recover(raw_text: &str, context_label: &str) -> Map<String, Value> {
    let cleaned = strip_fences(raw_text);

    // Strategy 1: direct parse of the fence-stripped text
    if let Some(map) = parse_object(cleaned) {
        return map;
    }

    // Strategy 2: first '{' to last '}' span
    if let Some(map) = first_to_last_brace(cleaned).and_then(parse_object) {
        debug!(context = context_label, "recovered via brace span");
        return map;
    }

    // Strategy 3: first balanced top-level object, trailing content ignored
    if let Some(map) = first_balanced_object(cleaned).and_then(parse_object) {
        debug!(context = context_label, "recovered via balanced scan");
        return map;
    }

    // Strategy 4: first well-formed object anywhere in the text
    if let Some(map) = any_balanced_object(cleaned) {
        debug!(context = context_label, "recovered via nested search");
        return map;
    }

    // Strategy 5: trailing-comma repair, then retry the brace span
    let repaired = repair_trailing_commas(cleaned);
    if let Some(map) = first_to_last_brace(&repaired).and_then(parse_object) {
        debug!(context = context_label, "recovered via comma repair");
        return map;
    }

    // Strategy 6: explicit empty result
    warn!(
        context = context_label,
        length = raw_text.len(),
        "structured-output recovery exhausted all strategies"
    );
    Map::new()
}

/// True when recovery produced no data
pub fn is_empty_result(map: &Map<String, Value>) -> bool {
    map.is_empty()
}

/// Strip a leading fenced-block marker (with or without a language tag) and
/// cut at the closing fence when one exists. Text without a leading fence is
/// only trimmed.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    // Drop the marker line, language tag included
    let body = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return trimmed,
    };
    // Content runs to the closing fence; commentary after it is not content
    match body.find("```") {
        Some(idx) => body[..idx].trim(),
        None => body.trim(),
    }
}

/// The inclusive span from the first '{' to the last '}'
fn first_to_last_brace(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Scan from the first '{' tracking brace depth and string-literal state
/// (escape sequences included) and return exactly the first balanced
/// top-level object.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    balanced_span(&text[start..]).map(|len| &text[start..start + len])
}

/// Try every '{' in order and return the first balanced span that parses as
/// an object.
fn any_balanced_object(text: &str) -> Option<Map<String, Value>> {
    for (offset, _) in text.char_indices().filter(|(_, c)| *c == '{') {
        if let Some(len) = balanced_span(&text[offset..]) {
            if let Some(map) = parse_object(&text[offset..offset + len]) {
                return Some(map);
            }
        }
    }
    None
}

/// Length in bytes of the balanced object beginning at the start of `text`,
/// which must begin with '{'.
fn balanced_span(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Remove trailing commas before a closing bracket or brace
fn repair_trailing_commas(text: &str) -> String {
    static TRAILING_COMMA: OnceLock<Regex> = OnceLock::new();
    let re = TRAILING_COMMA.get_or_init(|| Regex::new(r",\s*([}\]])").unwrap());
    re.replace_all(text, "$1").into_owned()
}

/// Parse text as JSON and keep it only when the top level is an object
fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
