use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which résumé field a suggestion targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Skill,
    Summary,
    Experience,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionAction {
    Add,
    Remove,
    Update,
    Modify,
    #[serde(other)]
    Other,
}

impl SuggestionAction {
    /// `update` and `modify` are synonyms.
    pub fn is_edit(self) -> bool {
        matches!(self, SuggestionAction::Update | SuggestionAction::Modify)
    }
}

/// A proposed single-field edit produced by the conversation service.
///
/// Deserializes from either naming convention on the wire
/// (`originalText`/`newText` or `old_text`/`new_text`) and always serializes
/// back in camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SuggestionWire", rename_all = "camelCase")]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub action: SuggestionAction,
    pub original_text: String,
    pub new_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionWire {
    #[serde(rename = "type")]
    kind: SuggestionKind,
    action: SuggestionAction,
    #[serde(default)]
    original_text: Option<String>,
    #[serde(default, rename = "old_text")]
    old_text: Option<String>,
    #[serde(default)]
    new_text: Option<String>,
    #[serde(default, rename = "new_text")]
    new_text_snake: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

impl From<SuggestionWire> for Suggestion {
    fn from(wire: SuggestionWire) -> Self {
        let original = wire.old_text.or(wire.original_text).unwrap_or_default();
        let new = wire.new_text_snake.or(wire.new_text).unwrap_or_default();
        Suggestion {
            kind: wire.kind,
            action: wire.action,
            original_text: original.trim().to_string(),
            new_text: new.trim().to_string(),
            reason: wire.reason,
        }
    }
}

impl Suggestion {
    #[cfg(test)]
    pub fn new(
        kind: SuggestionKind,
        action: SuggestionAction,
        original_text: impl Into<String>,
        new_text: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            action,
            original_text: original_text.into(),
            new_text: new_text.into(),
            reason: None,
        }
    }

    /// Short human-readable label, e.g. "Add skill: Docker".
    pub fn label(&self) -> String {
        let verb = match (self.kind, self.action) {
            (SuggestionKind::Skill, SuggestionAction::Add) => "Add skill",
            (SuggestionKind::Skill, _) => "Remove skill",
            (SuggestionKind::Summary, _) => "Update summary",
            _ => "Modify experience",
        };
        let text = if self.new_text.is_empty() {
            &self.original_text
        } else {
            &self.new_text
        };
        format!("{verb}: {text}")
    }
}

/// Identity assigned to each suggestion when it enters the pending set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuggestionId(pub Uuid);

impl SuggestionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SuggestionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SuggestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_fields() {
        let json = r#"{"type":"skill","action":"add","originalText":"Kotlin","newText":"Kotlin","reason":"JD asks for it"}"#;
        let s: Suggestion = serde_json::from_str(json).unwrap();
        assert_eq!(s.kind, SuggestionKind::Skill);
        assert_eq!(s.action, SuggestionAction::Add);
        assert_eq!(s.new_text, "Kotlin");
        assert_eq!(s.reason.as_deref(), Some("JD asks for it"));
    }

    #[test]
    fn test_snake_case_aliases() {
        let json = r#"{"type":"experience","action":"modify","old_text":"  Led Z ","new_text":"Led Z and Q"}"#;
        let s: Suggestion = serde_json::from_str(json).unwrap();
        assert_eq!(s.original_text, "Led Z");
        assert_eq!(s.new_text, "Led Z and Q");
    }

    #[test]
    fn test_snake_case_wins_when_both_present() {
        let json = r#"{"type":"summary","action":"update","newText":"camel","new_text":"snake"}"#;
        let s: Suggestion = serde_json::from_str(json).unwrap();
        assert_eq!(s.new_text, "snake");
        assert_eq!(s.original_text, "");
    }

    #[test]
    fn test_unknown_kind_and_action_deserialize_to_other() {
        let json = r#"{"type":"certification","action":"rewrite","newText":"AWS"}"#;
        let s: Suggestion = serde_json::from_str(json).unwrap();
        assert_eq!(s.kind, SuggestionKind::Other);
        assert_eq!(s.action, SuggestionAction::Other);
    }

    #[test]
    fn test_serializes_camel_case() {
        let s = Suggestion::new(
            SuggestionKind::Experience,
            SuggestionAction::Update,
            "old",
            "new",
        );
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["type"], "experience");
        assert_eq!(v["originalText"], "old");
        assert_eq!(v["newText"], "new");
        assert!(v.get("reason").is_none());
    }

    #[test]
    fn test_label() {
        let s = Suggestion::new(SuggestionKind::Skill, SuggestionAction::Remove, "React Native", "");
        assert_eq!(s.label(), "Remove skill: React Native");
    }
}
