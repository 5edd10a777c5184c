//! crates/fit_advisor_core/src/payload.rs
//!
//! Extracts structured JSON payloads from free-form model text.
//!
//! Models often wrap JSON in a fenced code block (with or without a language
//! tag). Every caller goes through [`parse_payload`] so that the fence
//! handling lives in exactly one place.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::ports::{PortError, PortResult};

const FENCE: &str = "```";

/// Removes a surrounding code fence and its optional language tag.
/// Text without a leading fence is only trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };
    let inner = match rest.find(FENCE) {
        Some(end) => &rest[..end],
        None => rest,
    };
    // A language tag is a run of word characters right after the opening fence.
    let tag_len = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(inner.len());
    inner[tag_len..].trim()
}

/// Parses a model answer as `T`, after stripping any code fence.
pub fn parse_payload<T: DeserializeOwned>(text: &str) -> PortResult<T> {
    let body = strip_code_fence(text);
    serde_json::from_str(body).map_err(|e| PortError::MalformedResponse(e.to_string()))
}

/// Like [`parse_payload`], but substitutes `default` when the text does not parse.
/// `what` names the payload in the warning log.
pub fn parse_payload_or_else<T, F>(text: &str, what: &str, default: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match parse_payload(text) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse {} payload, using default: {}", what, e);
            default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct SizeOnly {
        size: String,
    }

    #[test]
    fn plain_json_parses() {
        let parsed: SizeOnly = parse_payload(r#"  {"size": "M"} "#).unwrap();
        assert_eq!(parsed.size, "M");
    }

    #[test]
    fn fenced_json_with_tag_parses() {
        let text = "```json\n{\"size\": \"L\"}\n```";
        assert_eq!(strip_code_fence(text), "{\"size\": \"L\"}");
        let parsed: SizeOnly = parse_payload(text).unwrap();
        assert_eq!(parsed.size, "L");
    }

    #[test]
    fn fenced_json_without_tag_parses() {
        let parsed: SizeOnly = parse_payload("```\n{\"size\": \"S\"}\n```").unwrap();
        assert_eq!(parsed.size, "S");
    }

    #[test]
    fn tag_on_the_same_line_is_removed() {
        assert_eq!(strip_code_fence("```json{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn unterminated_fence_still_parses() {
        let parsed: SizeOnly = parse_payload("```json\n{\"size\": \"XL\"}").unwrap();
        assert_eq!(parsed.size, "XL");
    }

    #[test]
    fn prose_is_a_malformed_response() {
        let err = parse_payload::<SizeOnly>("I think you are a medium.").unwrap_err();
        assert!(matches!(err, PortError::MalformedResponse(_)));
    }

    #[test]
    fn wrong_shape_falls_back_to_default() {
        let parsed = parse_payload_or_else(r#"{"colour": "red"}"#, "size", || SizeOnly {
            size: "M".to_string(),
        });
        assert_eq!(parsed.size, "M");
    }
}
