//! Strict JSON envelope parsing that tolerates code-fenced wrappers (§6):
//! models are asked for `response_format: json_object` but frequently wrap
//! their answer in a ```json fence anyway.

use serde::de::DeserializeOwned;

use crate::error::OntologyError;

/// Parses `raw` as `T`, stripping a leading/trailing Markdown code fence
/// (` ```json ... ``` ` or plain ` ``` ... ``` `) first if present.
pub fn parse_json_envelope<T: DeserializeOwned>(raw: &str) -> Result<T, OntologyError> {
    let candidate = strip_code_fence(raw.trim());
    serde_json::from_str(candidate)
        .map_err(|e| OntologyError::Parse(format!("{e}: {candidate}")))
}

fn strip_code_fence(s: &str) -> &str {
    let s = s.trim();
    if !s.starts_with("```") {
        return s;
    }
    let without_open = match s.find('\n') {
        Some(idx) => &s[idx + 1..],
        None => return s,
    };
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, PartialEq, Debug)]
    struct Envelope {
        value: i32,
    }

    #[test]
    fn parses_plain_json() {
        let parsed: Envelope = parse_json_envelope(r#"{"value": 1}"#).unwrap();
        assert_eq!(parsed, Envelope { value: 1 });
    }

    #[test]
    fn strips_json_code_fence() {
        let raw = "```json\n{\"value\": 2}\n```";
        let parsed: Envelope = parse_json_envelope(raw).unwrap();
        assert_eq!(parsed, Envelope { value: 2 });
    }

    #[test]
    fn strips_plain_code_fence() {
        let raw = "```\n{\"value\": 3}\n```";
        let parsed: Envelope = parse_json_envelope(raw).unwrap();
        assert_eq!(parsed, Envelope { value: 3 });
    }

    #[test]
    fn parse_failure_is_an_error_not_a_panic() {
        let result: Result<Envelope, _> = parse_json_envelope("not json");
        assert!(result.is_err());
    }
}
