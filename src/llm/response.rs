//! Recovery of a JSON object from noisy model output.
//!
//! Models wrap answers in reasoning, markdown fences, and trailing remarks,
//! and often emit raw newlines inside string values. [`parse`] strips the
//! noise, repairs the common breakages, and parses with `serde_json`. It never
//! returns a partial object: either the whole object parses or it fails.

use crate::error::ResponseParseError;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```[A-Za-z0-9_-]*").unwrap());

/// Parse the JSON object in `output`.
///
/// With `prefix`, only text after its last case-insensitive occurrence is
/// considered. A missing prefix leaves the text untouched.
pub fn parse(output: &str, prefix: Option<&str>) -> Result<Value, ResponseParseError> {
    let text = match prefix {
        Some(prefix) => after_last(output, prefix),
        None => output,
    };
    let text = FENCE.replace_all(text, "");

    let start = text.find('{').ok_or(ResponseParseError::NoJsonObject)?;
    let last = text
        .rfind('}')
        .filter(|&last| last > start)
        .ok_or(ResponseParseError::NoJsonObject)?;

    // Widest span first. The balanced span is a fallback only when nothing
    // after it continues the object.
    let mut candidates = vec![last];
    if let Some(end) = balanced_end(&text, start) {
        if end < last && !continues_object(&text[end + 1..]) {
            candidates.push(end);
        }
    }

    let mut first_error = None;
    for end in candidates {
        let span = escape_control_chars_in_strings(&text[start..=end]);
        match parse_lenient(&span) {
            Ok(value) if value.is_object() => return Ok(value),
            Ok(_) => return Err(ResponseParseError::NotAnObject),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    ::log::error!("Unparseable model output:\n{}", output);
    Err(first_error
        .map(ResponseParseError::Json)
        .unwrap_or(ResponseParseError::NoJsonObject))
}

/// Text after the last case-insensitive occurrence of `marker`
pub fn after_last<'a>(text: &'a str, marker: &str) -> &'a str {
    if marker.is_empty() {
        return text;
    }
    // ASCII folding keeps byte offsets aligned with `text`.
    let haystack = text.to_ascii_lowercase();
    let needle = marker.to_ascii_lowercase();
    match haystack.rfind(&needle) {
        Some(index) => &text[index + needle.len()..],
        None => text,
    }
}

fn parse_lenient(candidate: &str) -> Result<Value, serde_json::Error> {
    match serde_json::from_str(candidate) {
        Ok(value) => Ok(value),
        Err(strict) => {
            let repaired = remove_trailing_commas(candidate);
            if repaired == candidate {
                return Err(strict);
            }
            serde_json::from_str(&repaired).map_err(|_| strict)
        }
    }
}

/// Whether `rest` reads like more members of an object that was closed early
fn continues_object(rest: &str) -> bool {
    matches!(
        rest.trim_start().chars().next(),
        Some(',' | ':' | '"' | '}' | ']')
    )
}

/// Byte index of the `}` closing the object that opens at `start`
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return (c == '}').then_some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Escape raw newlines, carriage returns, and tabs inside string literals
pub fn escape_control_chars_in_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            continue;
        }

        if escaped {
            escaped = false;
            out.push(c);
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                out.push(c);
            }
            '"' => {
                in_string = false;
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Drop commas that directly precede a closing `}` or `]`
fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            out.push(c);
            continue;
        }
        if c == '"' {
            in_string = true;
        }
        if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embedded_object_round_trips() {
        let object = json!({
            "businessOverview": "We sell {braces} and \"quotes\".",
            "uniqueSellingPoints": ["fast", "cheap", "good"],
            "nested": {"n": 1, "flag": true, "none": null}
        });
        let text = format!(
            "Let me think step by step... I considered {{draft}}.\nAnswer:\n```json\n{}\n```\nHope this helps! :}}",
            serde_json::to_string_pretty(&object).unwrap()
        );
        assert_eq!(parse(&text, Some("Answer:")).unwrap(), object);
    }

    #[test]
    fn test_last_prefix_occurrence_wins() {
        let text = r#"Plan. answer: {"draft": true} then more thinking.
ANSWER: {"final": true}"#;
        assert_eq!(parse(text, Some("Answer:")).unwrap(), json!({"final": true}));
    }

    #[test]
    fn test_missing_prefix_uses_whole_text() {
        assert_eq!(parse(r#"{"a": 1}"#, Some("Answer:")).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_raw_newlines_in_strings_are_escaped() {
        let text = "{\"competitiveDifference\": \"Paragraph one.\n\nParagraph two.\"}";
        let value = parse(text, None).unwrap();
        assert_eq!(value["competitiveDifference"], "Paragraph one.\n\nParagraph two.");
    }

    #[test]
    fn test_trailing_commas_are_tolerated() {
        let text = r#"{"a": [1, 2, 3,], "b": "x, ]",}"#;
        assert_eq!(parse(text, None).unwrap(), json!({"a": [1, 2, 3], "b": "x, ]"}));
    }

    #[test]
    fn test_garbage_fails_with_descriptive_error() {
        assert!(matches!(
            parse("no json here", None),
            Err(ResponseParseError::NoJsonObject)
        ));
        assert!(matches!(
            parse(r#"Answer: {"a": 1 "b": 2}"#, Some("answer:")),
            Err(ResponseParseError::Json(_))
        ));
    }

    #[test]
    fn test_stray_closing_brace_never_yields_partial_object() {
        let text = r#"Answer: {"businessOverview": "Widgets."}, "brandVoice": "plain", "servicesProducts": ["a"]}"#;
        assert!(matches!(
            parse(text, Some("Answer:")),
            Err(ResponseParseError::Json(_))
        ));
    }

    #[test]
    fn test_trailing_prose_with_brace_is_ignored() {
        let text = "Answer: {\"a\": {\"b\": 1}}\nThat is all :}";
        assert_eq!(parse(text, Some("Answer:")).unwrap(), json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_after_last_is_case_insensitive() {
        assert_eq!(after_last("x Answer: 1 answer: 2", "ANSWER:"), " 2");
        assert_eq!(after_last("nothing", "Answer:"), "nothing");
    }
}
