//! Structured-output parsing
//!
//! Models are asked for bare JSON but sometimes wrap it in markdown fences
//! or return an array where one object was requested. Parsing is a strict,
//! validating step with a tagged outcome; downstream code never does
//! best-effort string surgery on model text.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use vigil_core::LlmError;

/// A structured response that arrived either as the expected single value
/// or as an array of candidates. The synthesizer decides what to do with
/// `Many`; this layer only detects the shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Payload<T> {
    One(T),
    Many(Vec<T>),
}

/// Remove a surrounding markdown code fence, with or without a language
/// tag. Text without fences passes through untouched.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line ("json", "sql", ...), if any.
    let rest = match rest.split_once('\n') {
        Some((_tag, body)) => body,
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse model text into a validated payload.
///
/// # Returns
/// * `Ok(Payload::One(T))` - the expected object shape
/// * `Ok(Payload::Many(Vec<T>))` - an array of candidate objects
/// * `Err(LlmError::ParseFailed)` - non-JSON or schema-violating output
pub fn parse_payload<T: DeserializeOwned>(text: &str) -> Result<Payload<T>, LlmError> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(cleaned).map_err(|e| LlmError::ParseFailed {
        reason: format!("{} (response began: {:.60})", e, cleaned),
    })
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Sample {
        name: String,
        value: i32,
    }

    #[test]
    fn test_strip_fences_with_language_tag() {
        let text = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_fences_without_language_tag() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_fences_passthrough() {
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_single_object() {
        let payload: Payload<Sample> =
            parse_payload("{\"name\": \"cover\", \"value\": 3}").unwrap();
        assert_eq!(
            payload,
            Payload::One(Sample {
                name: "cover".to_string(),
                value: 3
            })
        );
    }

    #[test]
    fn test_parse_array_shape() {
        let payload: Payload<Sample> =
            parse_payload("[{\"name\": \"a\", \"value\": 1}, {\"name\": \"b\", \"value\": 2}]")
                .unwrap();
        match payload {
            Payload::Many(items) => assert_eq!(items.len(), 2),
            other => panic!("expected Many, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_fenced_object() {
        let payload: Payload<Sample> =
            parse_payload("```json\n{\"name\": \"x\", \"value\": 9}\n```").unwrap();
        assert!(matches!(payload, Payload::One(_)));
    }

    #[test]
    fn test_parse_rejects_prose() {
        let err = parse_payload::<Sample>("I think the risk is HIGH because...").unwrap_err();
        assert!(matches!(err, LlmError::ParseFailed { .. }));
    }

    #[test]
    fn test_parse_rejects_schema_violation() {
        // Right JSON, wrong shape: value must be a number.
        let err =
            parse_payload::<Sample>("{\"name\": \"x\", \"value\": \"lots\"}").unwrap_err();
        assert!(matches!(err, LlmError::ParseFailed { .. }));
    }
}
