use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::suggest::suggestion_model::{CurrentShape, DEFAULT_CONFIDENCE, RawSuggestion};

/// Which strategy produced a parse result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    JsonArray,
    CodeBlock,
    KeyValueLines,
    Nothing,
}

fn greedy_array_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[\s\S]*\]").expect("static regex"))
}

fn code_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("static regex"))
}

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("static regex"))
}

/// Turn free-form model output into suggestion records.
///
/// Never fails: unusable text yields an empty list.
pub fn parse_suggestions(content: &str) -> Vec<RawSuggestion> {
    parse_with_strategy(content).0
}

/// Same as `parse_suggestions`, also reporting which strategy won.
pub fn parse_with_strategy(content: &str) -> (Vec<RawSuggestion>, ParseStrategy) {
    if let Some(items) = extract_json_array(content) {
        debug!(records = items.len(), "parsed suggestions as JSON array");
        return (records_from(&items), ParseStrategy::JsonArray);
    }

    if let Some(items) = extract_code_block(content) {
        debug!(records = items.len(), "parsed suggestions from code block");
        return (records_from(&items), ParseStrategy::CodeBlock);
    }

    let lines = parse_key_value_lines(content);
    if !lines.is_empty() {
        debug!(records = lines.len(), "parsed suggestions from key/value lines");
        return (lines, ParseStrategy::KeyValueLines);
    }

    debug!("no parse strategy produced suggestions");
    (Vec::new(), ParseStrategy::Nothing)
}

fn records_from(items: &[Value]) -> Vec<RawSuggestion> {
    items.iter().filter_map(RawSuggestion::from_value).collect()
}

fn decode_array(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

// ----------------------------------------------------------------------------
// Strategy 1: bare JSON array
// ----------------------------------------------------------------------------

/// The widest `[ ... ]` span. When that does not decode, the first balanced
/// span, but only if it holds at least one object; bracketed prose such as
/// `[1]` must not hide a real answer further on.
fn extract_json_array(content: &str) -> Option<Vec<Value>> {
    let greedy = greedy_array_re().find(content)?;
    if let Some(items) = decode_array(greedy.as_str()) {
        return Some(items);
    }

    let items = decode_array(balanced_array_span(content)?)?;
    items.iter().any(Value::is_object).then_some(items)
}

/// Span from the first `[` to its matching `]`, ignoring brackets inside
/// JSON strings.
fn balanced_array_span(content: &str) -> Option<&str> {
    let start = content.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in content[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

// ----------------------------------------------------------------------------
// Strategy 2: fenced code block
// ----------------------------------------------------------------------------

fn extract_code_block(content: &str) -> Option<Vec<Value>> {
    let captures = code_fence_re().captures(content)?;
    decode_array(captures.get(1)?.as_str())
}

// ----------------------------------------------------------------------------
// Strategy 3: `key: value` lines
// ----------------------------------------------------------------------------

#[derive(Default)]
struct LineRecord {
    id: Option<String>,
    value: Option<String>,
    confidence: Option<f32>,
}

impl LineRecord {
    fn is_empty(&self) -> bool {
        self.id.is_none() && self.value.is_none() && self.confidence.is_none()
    }

    fn into_raw(self) -> RawSuggestion {
        RawSuggestion::Current(CurrentShape {
            id: self.id,
            name: None,
            value: self.value,
            confidence: self.confidence,
        })
    }
}

fn parse_key_value_lines(content: &str) -> Vec<RawSuggestion> {
    let mut records = Vec::new();
    let mut current = LineRecord::default();

    for line in content.lines() {
        let trimmed = line.trim();

        // Headers and separators
        if trimmed.is_empty() || trimmed.contains("suggestions") || trimmed.contains("---") {
            continue;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        let value = value.trim();
        let clean_key: String = key
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase())
            .collect();

        // "confidence" contains "id", so it is checked first
        if clean_key.contains("confidence") {
            current.confidence = Some(line_confidence(value));
        } else if clean_key.contains("field") || clean_key.contains("name") || clean_key.contains("id") {
            if !current.is_empty() {
                records.push(std::mem::take(&mut current).into_raw());
            }
            current.id = Some(strip_quotes(value));
        } else if clean_key.contains("value") || clean_key.contains("suggestion") {
            current.value = Some(strip_quotes(value));
        }
    }

    if !current.is_empty() {
        records.push(current.into_raw());
    }

    records
}

fn strip_quotes(value: &str) -> String {
    value.chars().filter(|c| *c != '"' && *c != '\'').collect()
}

/// First digit run read as a percentage: `90%` and `90` are both 0.9.
/// A written decimal such as `0.75` reads as its leading `0`.
fn line_confidence(value: &str) -> f32 {
    match digits_re().find(value).and_then(|m| m.as_str().parse::<u32>().ok()) {
        Some(n) => (n as f32 / 100.0).clamp(0.0, 1.0),
        None => DEFAULT_CONFIDENCE,
    }
}
