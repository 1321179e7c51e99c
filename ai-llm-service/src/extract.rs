//! Extraction of the structured code artifact from raw model output.
//!
//! The code prompt asks the model to answer with a fenced ```json block.
//! When such a block is present it is decoded strictly and a bad block fails
//! closed. Without a fence, decoding starts at the first `{` and reads exactly
//! one JSON value, so braces inside string values and trailing prose are fine.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error_handler::ParseError;

/// Generated code together with its declared type and a short description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeArtifact {
    pub code: String,
    /// Declared type as returned by the model. Not validated here.
    #[serde(alias = "codeType")]
    pub code_type: String,
    #[serde(default)]
    pub description: String,
}

/// Locates and decodes the `{code, code_type, description}` object in `raw`.
///
/// # Errors
/// Returns [`ParseError`] carrying `raw` verbatim when no object can be decoded.
pub fn extract_structured(raw: &str) -> Result<CodeArtifact, ParseError> {
    if let Some(block) = first_json_fence(raw) {
        let body = block.map_err(|reason| fail(raw, reason))?;
        debug!(len = body.len(), "decoding fenced JSON block");
        return serde_json::from_str::<CodeArtifact>(body.trim())
            .map_err(|e| fail(raw, format!("fenced block is not a code object: {e}")));
    }

    let start = raw
        .find('{')
        .ok_or_else(|| fail(raw, "no JSON object found".into()))?;

    let mut stream = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<CodeArtifact>();
    match stream.next() {
        Some(Ok(artifact)) => Ok(artifact),
        Some(Err(e)) => Err(fail(raw, format!("invalid JSON object: {e}"))),
        None => Err(fail(raw, "no JSON object found".into())),
    }
}

fn fail(raw: &str, reason: String) -> ParseError {
    warn!(%reason, raw_len = raw.len(), "code extraction failed");
    ParseError {
        reason,
        raw: raw.to_string(),
    }
}

/// Returns the body of the first fenced block tagged `json` or untagged.
///
/// `Some(Err(_))` means such a block was opened but never closed.
fn first_json_fence(raw: &str) -> Option<Result<&str, String>> {
    let mut rest = raw;
    while let Some(open) = rest.find("```") {
        let after_ticks = &rest[open + 3..];
        let (tag, body_start) = match after_ticks.find('\n') {
            Some(nl) => (after_ticks[..nl].trim(), nl + 1),
            None => return None,
        };
        let body = &after_ticks[body_start..];
        let close = body.find("```");

        if tag.is_empty() || tag.eq_ignore_ascii_case("json") {
            return Some(match close {
                Some(end) => Ok(&body[..end]),
                None => Err("unterminated fenced block".to_string()),
            });
        }

        match close {
            Some(end) => rest = &body[end + 3..],
            None => return None,
        }
    }
    None
}
