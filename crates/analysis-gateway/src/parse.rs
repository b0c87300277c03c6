//! Decoding of provider text
//!
//! The provider is asked for JSON but is a text generator, so every reply is
//! treated as untrusted text: code fences are stripped, trailing separators
//! are repaired, and anything that still fails to decode becomes `None`.

use serde::de::DeserializeOwned;
use tracing::{debug, error};

const FENCE: &str = "```";

/// Remove a fence that opens or closes the trimmed text, with the info
/// string (`json`, `JSON`, ...) of an opening fence. Backticks anywhere else
/// are payload and stay.
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix(FENCE) {
        body = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = body.strip_suffix(FENCE) {
        body = rest;
    }

    body.trim()
}

/// Contents of the first fenced block inside surrounding prose
pub fn extract_fenced_block(text: &str) -> Option<&str> {
    let open = text.find(FENCE)?;
    let after_open = &text[open + FENCE.len()..];
    let body = after_open.trim_start_matches(|c: char| c.is_ascii_alphanumeric());

    let body = match body.find(FENCE) {
        Some(close) => &body[..close],
        None => body,
    };

    Some(body.trim())
}

/// Drop commas that directly precede a closing `}` or `]`.
/// Commas inside string literals are left alone.
pub fn repair_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
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
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Fence stripping followed by trailing-comma repair
pub fn clean_response(text: &str) -> String {
    repair_trailing_commas(strip_code_fences(text))
}

/// Decode provider text into `T`, or `None` if it cannot be decoded.
///
/// Tried in order: the text with its outer fences removed, the raw text,
/// then the first fenced block inside prose. Each candidate gets the
/// trailing-comma repair. Failures are logged with the raw payload. The
/// decoded value is returned as-is; ranges are not re-checked here.
pub fn decode_response<T: DeserializeOwned>(text: Option<&str>) -> Option<T> {
    let raw = match text {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => {
            debug!("Provider returned no text");
            return None;
        }
    };

    let first_error = match serde_json::from_str(&clean_response(raw)) {
        Ok(value) => return Some(value),
        Err(e) => e,
    };

    let fallbacks = [Some(raw.trim()), extract_fenced_block(raw)];
    for candidate in fallbacks.into_iter().flatten() {
        if let Ok(value) = serde_json::from_str(&repair_trailing_commas(candidate)) {
            debug!("Provider response decoded on fallback");
            return Some(value);
        }
    }

    error!(error = %first_error, raw_payload = %raw, "Failed to decode provider response");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        a: i64,
    }

    #[test]
    fn test_fenced_payload_with_trailing_comma() {
        let value: Value = decode_response(Some("```json\n{\"a\":1,}\n```")).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_typed_decode() {
        let sample: Sample = decode_response(Some("```JSON\n{\"a\": 7}\n```")).unwrap();
        assert_eq!(sample, Sample { a: 7 });
    }

    #[test]
    fn test_not_json_is_absent() {
        assert!(decode_response::<Value>(Some("not json at all")).is_none());
    }

    #[test]
    fn test_empty_and_missing_text_are_absent() {
        assert!(decode_response::<Value>(None).is_none());
        assert!(decode_response::<Value>(Some("   \n")).is_none());
    }

    #[test]
    fn test_shape_mismatch_is_absent() {
        // All-or-nothing: a structurally valid reply with the wrong shape
        // is not partially decoded
        assert!(decode_response::<Sample>(Some("{\"b\": 1}")).is_none());
        assert!(decode_response::<Sample>(Some("{\"a\": \"one\"}")).is_none());
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```json{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_inner_backticks_are_payload() {
        let text = r#"{"reasoning":"plate read as ```GR-12```","a":1}"#;
        assert_eq!(strip_code_fences(text), text);

        let value: Value = decode_response(Some(text)).unwrap();
        assert_eq!(value["reasoning"], "plate read as ```GR-12```");
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_stray_closing_fence() {
        let value: Value = decode_response(Some("{\"a\":1}\n```")).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_fenced_block_inside_prose() {
        let text = "Here is the result:\n```json\n{\"a\":1,}\n```\nDone.";
        assert_eq!(extract_fenced_block(text), Some("{\"a\":1,}"));
        assert!(extract_fenced_block("{\"a\":1}").is_none());

        let value: Value = decode_response(Some(text)).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_repair_trailing_commas() {
        assert_eq!(repair_trailing_commas("{\"a\":1,}"), "{\"a\":1}");
        assert_eq!(repair_trailing_commas("[1, 2, ]"), "[1, 2 ]");
        assert_eq!(
            repair_trailing_commas("{\"a\":[1,\n],\n}"),
            "{\"a\":[1\n]\n}"
        );
    }

    #[test]
    fn test_repair_leaves_strings_alone() {
        let text = r#"{"reasoning":"plate, }blurred\", ]", "b":2,}"#;
        let repaired = repair_trailing_commas(text);
        assert_eq!(repaired, r#"{"reasoning":"plate, }blurred\", ]", "b":2}"#);

        let value: Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value["reasoning"], "plate, }blurred\", ]");
    }

    #[test]
    fn test_valid_json_is_untouched() {
        let text = r#"{"a":[1,2],"b":{"c":"x,y"}}"#;
        assert_eq!(clean_response(text), text);
    }
}
