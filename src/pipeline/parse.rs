//! Turn the model's text into an [`AnalysisResult`].
//!
//! The prompt asks for bare JSON, but models often wrap it in a
//! ```` ```json ```` fence anyway, or put a sentence in front of it. Parsing
//! is best-effort and never repairs the JSON itself:
//!
//! 1. Strip invisible characters (BOM, zero-width spaces).
//! 2. Remove every fence marker (```` ```json ```` and ```` ``` ````).
//! 3. Parse the remainder as an object; if it is not one, parse the
//!    outermost `{ … }` span.
//!
//! Anything else, including valid JSON that is not an object, is an
//! [`AnalystError::MalformedJson`].

use crate::error::AnalystError;
use crate::result::AnalysisResult;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Characters of the response echoed back in a parse error.
const EXCERPT_CHARS: usize = 120;

/// Parse raw model text into a result.
///
/// Only a JSON object is a result. A bare string, number or array is
/// rejected unless an object can be cut out of it.
pub fn parse_response(text: &str) -> Result<AnalysisResult, AnalystError> {
    let cleaned = strip_code_fences(&remove_invisible_chars(text));

    let detail = match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) if value.is_object() => return Ok(AnalysisResult::from_value(value)),
        Ok(other) => format!("expected a JSON object, got {}", json_kind(&other)),
        Err(e) => e.to_string(),
    };

    if let Some(span) = outer_object(&cleaned) {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(span) {
            return Ok(AnalysisResult::from_value(value));
        }
    }

    Err(AnalystError::MalformedJson {
        detail,
        excerpt: cleaned.chars().take(EXCERPT_CHARS).collect(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Fences ───────────────────────────────────────────────────────────────────

static RE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[ \t]*(?i:json)?").expect("fence regex is valid"));

/// Remove every fence marker, with or without a `json` tag, and trim.
pub fn strip_code_fences(input: &str) -> String {
    RE_FENCE.replace_all(input, "").trim().to_string()
}

// ── Invisible characters ─────────────────────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Fallback span ────────────────────────────────────────────────────────────

/// The text between the first `{` and the last `}`, inclusive.
fn outer_object(input: &str) -> Option<&str> {
    let start = input.find('{')?;
    let end = input.rfind('}')?;
    (end > start).then(|| &input[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::TextField;

    const BODY: &str = r#"{"Meta": {"Company Name": "Acme", "Quarter/Period": "Q2"}}"#;

    #[test]
    fn test_strip_fences() {
        let input = format!("```json\n{BODY}\n```");
        assert_eq!(strip_code_fences(&input), BODY);
    }

    #[test]
    fn test_strip_fences_no_lang() {
        let input = format!("```\n{BODY}\n```");
        assert_eq!(strip_code_fences(&input), BODY);
    }

    #[test]
    fn test_no_fences_passthrough() {
        assert_eq!(strip_code_fences(BODY), BODY);
    }

    #[test]
    fn fenced_and_bare_parse_identically() {
        let fenced = parse_response(&format!("```json\n{BODY}\n```")).unwrap();
        let bare = parse_response(BODY).unwrap();
        assert_eq!(fenced, bare);
        assert_eq!(bare.text(TextField::CompanyName), "Acme");
    }

    #[test]
    fn leading_prose_is_skipped() {
        let text = format!("Here is the analysis you asked for:\n{BODY}\nLet me know!");
        let r = parse_response(&text).unwrap();
        assert_eq!(r.text(TextField::Period), "Q2");
    }

    #[test]
    fn bom_is_ignored() {
        let r = parse_response(&format!("\u{FEFF}{BODY}")).unwrap();
        assert_eq!(r.text(TextField::CompanyName), "Acme");
    }

    #[test]
    fn prose_without_json_is_an_error() {
        let err = parse_response("The company had a strong quarter overall.").unwrap_err();
        assert!(err.is_analysis_error());
        match err {
            AnalystError::MalformedJson { excerpt, .. } => {
                assert!(excerpt.starts_with("The company"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn quoted_refusal_is_an_error() {
        let err = parse_response("\"I cannot analyse this document.\"").unwrap_err();
        match err {
            AnalystError::MalformedJson { detail, .. } => {
                assert!(detail.contains("a string"), "got: {detail}")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(parse_response("42").is_err());
        assert!(parse_response("[1, 2]").is_err());
    }

    #[test]
    fn array_wrapped_object_is_unwrapped() {
        let r = parse_response(&format!("```json\n[{BODY}]\n```")).unwrap();
        assert!(r.raw().is_object());
        assert_eq!(r.text(TextField::CompanyName), "Acme");
    }

    #[test]
    fn empty_text_is_an_error() {
        assert!(parse_response("```json\n```").is_err());
    }

    #[test]
    fn excerpt_is_bounded() {
        let long = "x".repeat(1000);
        match parse_response(&long).unwrap_err() {
            AnalystError::MalformedJson { excerpt, .. } => {
                assert_eq!(excerpt.chars().count(), EXCERPT_CHARS)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
