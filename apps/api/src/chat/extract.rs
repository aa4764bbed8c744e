//! Pulls suggestions out of the assistant's reply.
//!
//! The conversation service normally returns structured suggestions. When it
//! does not, the assistant text may carry them after a `SUGGESTIONS:` marker as
//! a JSON array, possibly inside a code fence.

use serde_json::Value;
use tracing::{debug, warn};

use crate::models::suggestion::Suggestion;

const SUGGESTIONS_MARKER: &str = "SUGGESTIONS:";

/// An assistant reply split into displayable text and parsed suggestions.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    pub text: String,
    pub suggestions: Vec<Suggestion>,
}

/// Splits `text` at the `SUGGESTIONS:` marker. On any parse failure the text
/// is returned unmodified with no suggestions.
pub fn extract_suggestions(text: &str) -> AssistantReply {
    let unchanged = || AssistantReply {
        text: text.to_string(),
        suggestions: Vec::new(),
    };

    let Some(marker) = text.find(SUGGESTIONS_MARKER) else {
        return unchanged();
    };

    let clean_text = text[..marker].trim().to_string();
    let tail = text[marker + SUGGESTIONS_MARKER.len()..].trim();
    let json_text = fenced_block(tail).unwrap_or(tail);

    let Some(array) = json_array(json_text) else {
        debug!("SUGGESTIONS marker present but no JSON array found");
        return unchanged();
    };

    match serde_json::from_str::<Vec<Suggestion>>(array) {
        Ok(suggestions) => AssistantReply {
            text: clean_text,
            suggestions,
        },
        Err(e) => {
            warn!("Failed to parse suggestions: {e}");
            unchanged()
        }
    }
}

/// Combines the structured suggestions of a reply (if any) with the text
/// fallback. Structured suggestions win; the marker block is still stripped
/// from the displayed text.
pub fn resolve_reply(message: &str, structured: Option<Value>) -> AssistantReply {
    let structured = structured.and_then(structured_suggestions);

    let parsed = extract_suggestions(message);
    match structured {
        Some(suggestions) if !suggestions.is_empty() => {
            let text = if parsed.text.is_empty() {
                message.to_string()
            } else {
                parsed.text
            };
            AssistantReply { text, suggestions }
        }
        _ => parsed,
    }
}

/// Decodes a structured `suggestions` array item by item, so one malformed
/// entry does not take its siblings down with it.
fn structured_suggestions(value: Value) -> Option<Vec<Suggestion>> {
    let Value::Array(items) = value else {
        warn!("Discarding structured suggestions: not an array");
        return None;
    };
    let suggestions = items
        .into_iter()
        .filter_map(|item| {
            serde_json::from_value::<Suggestion>(item)
                .map_err(|e| warn!("Skipping malformed suggestion: {e}"))
                .ok()
        })
        .collect();
    Some(suggestions)
}

/// Contents of the first ``` or ```json fenced block.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    let close = after.find("```")?;
    Some(after[..close].trim())
}

/// From the first `[` to the last `]`, inclusive.
fn json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}
