use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::suggestion::{Suggestion, SuggestionId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSuggestion {
    pub id: SuggestionId,
    pub suggestion: Suggestion,
}

/// Suggestions awaiting accept/reject, grouped by the index of the chat
/// message that produced them. A message with nothing left pending has no
/// entry at all.
#[derive(Debug, Clone, Default)]
pub struct PendingSuggestions {
    by_message: BTreeMap<usize, Vec<PendingSuggestion>>,
}

impl PendingSuggestions {
    /// Registers suggestions for a message, assigning each a fresh id.
    /// Returns what was registered (nothing, for an empty batch).
    pub fn propose(
        &mut self,
        message_index: usize,
        suggestions: Vec<Suggestion>,
    ) -> Vec<PendingSuggestion> {
        if suggestions.is_empty() {
            return Vec::new();
        }
        let batch: Vec<PendingSuggestion> = suggestions
            .into_iter()
            .map(|suggestion| PendingSuggestion {
                id: SuggestionId::new(),
                suggestion,
            })
            .collect();
        self.by_message
            .entry(message_index)
            .or_default()
            .extend(batch.iter().cloned());
        batch
    }

    /// Removes a suggestion from the pending set, dropping its message entry
    /// if that empties it.
    pub fn take(&mut self, id: SuggestionId) -> Option<(usize, Suggestion)> {
        let (message_index, position) = self.by_message.iter().find_map(|(index, list)| {
            list.iter()
                .position(|p| p.id == id)
                .map(|position| (*index, position))
        })?;

        let list = self.by_message.get_mut(&message_index)?;
        let removed = list.remove(position);
        if list.is_empty() {
            self.by_message.remove(&message_index);
        }
        Some((message_index, removed.suggestion))
    }

    /// Empties the pending set, yielding suggestions in message order.
    pub fn drain(&mut self) -> Vec<PendingSuggestion> {
        std::mem::take(&mut self.by_message)
            .into_values()
            .flatten()
            .collect()
    }

    #[cfg(test)]
    pub fn for_message(&self, message_index: usize) -> Option<&[PendingSuggestion]> {
        self.by_message.get(&message_index).map(Vec::as_slice)
    }

    #[cfg(test)]
    pub fn contains(&self, id: SuggestionId) -> bool {
        self.by_message.values().flatten().any(|p| p.id == id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.by_message.values().map(Vec::len).sum()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.by_message.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_message.clear();
    }

    pub fn grouped(&self) -> &BTreeMap<usize, Vec<PendingSuggestion>> {
        &self.by_message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::suggestion::{SuggestionAction, SuggestionKind};

    fn skill(name: &str) -> Suggestion {
        Suggestion::new(SuggestionKind::Skill, SuggestionAction::Add, name, name)
    }

    #[test]
    fn test_propose_assigns_unique_ids() {
        let mut pending = PendingSuggestions::default();
        // structurally identical suggestions stay distinct
        let batch = pending.propose(1, vec![skill("Docker"), skill("Docker")]);
        assert_eq!(batch.len(), 2);
        assert_ne!(batch[0].id, batch[1].id);
        assert_eq!(pending.len(), 2);
    }

    #[test]
    fn test_empty_batch_creates_no_entry() {
        let mut pending = PendingSuggestions::default();
        assert!(pending.propose(3, vec![]).is_empty());
        assert!(pending.is_empty());
        assert!(pending.for_message(3).is_none());
    }

    #[test]
    fn test_take_removes_emptied_message_entry() {
        let mut pending = PendingSuggestions::default();
        let first = pending.propose(1, vec![skill("Docker")]);
        let second = pending.propose(3, vec![skill("Kotlin"), skill("Go")]);

        let (index, s) = pending.take(first[0].id).unwrap();
        assert_eq!(index, 1);
        assert_eq!(s.new_text, "Docker");
        assert!(pending.for_message(1).is_none());
        assert_eq!(pending.for_message(3).unwrap().len(), 2);

        pending.take(second[1].id).unwrap();
        assert_eq!(pending.for_message(3).unwrap().len(), 1);
        assert_eq!(pending.for_message(3).unwrap()[0].id, second[0].id);

        pending.take(second[0].id).unwrap();
        assert!(pending.is_empty());
        assert!(pending.grouped().is_empty());
    }

    #[test]
    fn test_take_unknown_id() {
        let mut pending = PendingSuggestions::default();
        pending.propose(1, vec![skill("Docker")]);
        assert!(pending.take(SuggestionId::new()).is_none());
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_take_twice_fails_second_time() {
        let mut pending = PendingSuggestions::default();
        let batch = pending.propose(1, vec![skill("Docker")]);
        assert!(pending.take(batch[0].id).is_some());
        assert!(pending.take(batch[0].id).is_none());
    }

    #[test]
    fn test_drain_is_in_message_order() {
        let mut pending = PendingSuggestions::default();
        pending.propose(5, vec![skill("C")]);
        pending.propose(1, vec![skill("A"), skill("B")]);

        let drained: Vec<_> = pending
            .drain()
            .into_iter()
            .map(|p| p.suggestion.new_text)
            .collect();
        assert_eq!(drained, vec!["A", "B", "C"]);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_contains() {
        let mut pending = PendingSuggestions::default();
        let batch = pending.propose(1, vec![skill("Docker")]);
        assert!(pending.contains(batch[0].id));
        pending.clear();
        assert!(!pending.contains(batch[0].id));
    }
}
