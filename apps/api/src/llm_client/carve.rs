//! Best-effort JSON carve-out from free-form model output.
//!
//! The model is not trusted to return *only* JSON: responses may carry
//! preamble prose, markdown fences, or trailing commentary. This module
//! locates the first `{`/`[` and the matching last `}`/`]` and hands the
//! substring to serde. Every caller handles the failure path through the
//! same explicit result type — no ad hoc try/catch at call sites.

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CarveError {
    #[error("no JSON object or array found in response text")]
    NoJson,

    #[error("carved JSON failed to deserialize: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Returns the substring spanning the first `{` (or `[`) through the last
/// `}` (or `]`), whichever delimiter kind opens first.
pub fn carve_json(raw: &str) -> Result<&str, CarveError> {
    let object = span(raw, '{', '}');
    let array = span(raw, '[', ']');

    let (start, end) = match (object, array) {
        (Some(o), Some(a)) => {
            if o.0 < a.0 {
                o
            } else {
                a
            }
        }
        (Some(o), None) => o,
        (None, Some(a)) => a,
        (None, None) => return Err(CarveError::NoJson),
    };

    Ok(&raw[start..=end])
}

/// Carves and deserializes in one step.
pub fn carve_and_parse<T: DeserializeOwned>(raw: &str) -> Result<T, CarveError> {
    let carved = carve_json(raw)?;
    Ok(serde_json::from_str(carved)?)
}

fn span(raw: &str, open: char, close: char) -> Option<(usize, usize)> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    (end > start).then_some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_carve_plain_object() {
        assert_eq!(carve_json(r#"{"a": 1}"#).unwrap(), r#"{"a": 1}"#);
    }

    #[test]
    fn test_carve_object_with_surrounding_prose() {
        let raw = "Here is the analysis you asked for:\n{\"score\": 70}\nLet me know!";
        assert_eq!(carve_json(raw).unwrap(), r#"{"score": 70}"#);
    }

    #[test]
    fn test_carve_object_inside_markdown_fences() {
        let raw = "```json\n{\"score\": 70}\n```";
        assert_eq!(carve_json(raw).unwrap(), r#"{"score": 70}"#);
    }

    #[test]
    fn test_carve_array() {
        let raw = "Sure: [1, 2, 3] — done.";
        assert_eq!(carve_json(raw).unwrap(), "[1, 2, 3]");
    }

    #[test]
    fn test_array_opening_before_object_wins() {
        let raw = r#"[{"a": 1}, {"a": 2}]"#;
        assert_eq!(carve_json(raw).unwrap(), raw);
    }

    #[test]
    fn test_no_braces_at_all_is_no_json() {
        let raw = "I am sorry, I cannot analyze this CV.";
        assert!(matches!(carve_json(raw), Err(CarveError::NoJson)));
    }

    #[test]
    fn test_close_before_open_is_no_json() {
        assert!(matches!(carve_json("} nope {"), Err(CarveError::NoJson)));
    }

    #[test]
    fn test_carve_and_parse_returns_typed_value() {
        let raw = "noise {\"score\": 70} noise";
        let value: Value = carve_and_parse(raw).unwrap();
        assert_eq!(value["score"], 70);
    }

    #[test]
    fn test_carve_and_parse_surfaces_parse_failure() {
        let raw = "{not valid json}";
        let result: Result<Value, _> = carve_and_parse(raw);
        assert!(matches!(result, Err(CarveError::Parse(_))));
    }
}
