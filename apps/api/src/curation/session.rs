use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::{ChatMode, ChatRole, ChatTurn};
use crate::curation::pending::{PendingSuggestion, PendingSuggestions};
use crate::models::resume::{ExtractedResume, ResumeDocument};
use crate::models::suggestion::{Suggestion, SuggestionId};
use crate::reconcile;

#[derive(Debug, Error)]
pub enum CurationError {
    #[error("Session {0} not found")]
    UnknownSession(Uuid),

    #[error("Suggestion {0} is not pending")]
    UnknownSuggestion(SuggestionId),

    #[error("Select a chat mode before sending messages")]
    NoModeSelected,

    #[error("Message cannot be empty")]
    EmptyMessage,
}

/// Change notifications emitted by a session. The registry broadcasts them
/// after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Opened,
    ResumeReplaced,
    ModeSelected { mode: ChatMode },
    SuggestionsProposed { message_index: usize, count: usize },
    SuggestionAccepted { id: SuggestionId, applied: bool },
    SuggestionRejected { id: SuggestionId },
    AppliedAll { applied: usize, missed: usize },
    CuratedDiscarded,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptOutcome {
    pub id: SuggestionId,
    pub suggestion: Suggestion,
    /// False when no target was found; the curated copy is unchanged.
    pub applied: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyAllReport {
    pub applied: Vec<SuggestionId>,
    pub missed: Vec<SuggestionId>,
}

/// Outbound chat call prepared while the session is locked and sent after
/// the lock is released.
#[derive(Debug, Clone)]
pub struct PreparedChat {
    pub epoch: u64,
    pub mode: ChatMode,
    pub history: Vec<ChatTurn>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantTurn {
    pub message_index: usize,
    pub content: String,
    pub pending: Vec<PendingSuggestion>,
}

/// Serializable view of a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mode: Option<ChatMode>,
    pub resume: ResumeDocument,
    pub curated: Option<ResumeDocument>,
    pub transcript: Vec<ChatTurn>,
    pub pending: Vec<PendingGroup>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingGroup {
    pub message_index: usize,
    pub suggestions: Vec<PendingSuggestion>,
}

/// One user's working state: canonical résumé, curated copy, conversation,
/// and pending suggestions.
///
/// Suggestions only ever touch the curated copy, which is cloned from the
/// canonical résumé on the first accepted suggestion.
#[derive(Debug)]
pub struct CurationSession {
    id: Uuid,
    user_id: Uuid,
    mode: Option<ChatMode>,
    resume: ResumeDocument,
    curated: Option<ResumeDocument>,
    transcript: Vec<ChatTurn>,
    pending: PendingSuggestions,
    /// Bumped on every conversation reset so late chat replies can be dropped.
    epoch: u64,
    updated_at: DateTime<Utc>,
    events: Vec<SessionEvent>,
}

impl CurationSession {
    pub fn new(user_id: Uuid, resume: ResumeDocument) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            mode: None,
            resume,
            curated: None,
            transcript: Vec::new(),
            pending: PendingSuggestions::default(),
            epoch: 0,
            updated_at: Utc::now(),
            events: vec![SessionEvent::Opened],
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    #[cfg(test)]
    pub fn mode(&self) -> Option<ChatMode> {
        self.mode
    }

    /// Last time the session changed; reads do not count.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn resume(&self) -> &ResumeDocument {
        &self.resume
    }

    pub fn curated(&self) -> Option<&ResumeDocument> {
        self.curated.as_ref()
    }

    /// The curated copy when one exists, otherwise the canonical résumé.
    pub fn display_document(&self) -> &ResumeDocument {
        self.curated.as_ref().unwrap_or(&self.resume)
    }

    #[cfg(test)]
    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    #[cfg(test)]
    pub fn pending(&self) -> &PendingSuggestions {
        &self.pending
    }

    pub fn replace_resume(&mut self, resume: ResumeDocument) {
        self.resume = resume;
        self.touch(SessionEvent::ResumeReplaced);
    }

    pub fn merge_extracted(&mut self, extracted: ExtractedResume) {
        self.resume.merge_extracted(extracted);
        self.touch(SessionEvent::ResumeReplaced);
    }

    /// Switches chat mode, starting a fresh conversation with nothing pending.
    pub fn select_mode(&mut self, mode: ChatMode) {
        self.mode = Some(mode);
        self.transcript.clear();
        self.pending.clear();
        self.epoch += 1;
        self.touch(SessionEvent::ModeSelected { mode });
    }

    /// Records the user's message and captures what the conversation service
    /// needs. History excludes the message being sent.
    pub fn prepare_chat(&mut self, message: &str) -> Result<PreparedChat, CurationError> {
        let mode = self.mode.ok_or(CurationError::NoModeSelected)?;
        let message = message.trim();
        if message.is_empty() {
            return Err(CurationError::EmptyMessage);
        }
        let history = self.transcript.clone();
        self.transcript.push(ChatTurn {
            role: ChatRole::User,
            content: message.to_string(),
        });
        self.updated_at = Utc::now();
        Ok(PreparedChat {
            epoch: self.epoch,
            mode,
            history,
            message: message.to_string(),
        })
    }

    /// Appends the assistant's reply and registers its suggestions as pending.
    /// Returns `None` if the conversation was reset while the call was in flight.
    pub fn record_reply(
        &mut self,
        epoch: u64,
        content: String,
        suggestions: Vec<Suggestion>,
    ) -> Option<AssistantTurn> {
        if epoch != self.epoch {
            debug!("Dropping chat reply for stale conversation in session {}", self.id);
            return None;
        }
        self.transcript.push(ChatTurn {
            role: ChatRole::Assistant,
            content: content.clone(),
        });
        let message_index = self.transcript.len() - 1;
        let pending = self.pending.propose(message_index, suggestions);
        if pending.is_empty() {
            self.updated_at = Utc::now();
        } else {
            self.touch(SessionEvent::SuggestionsProposed {
                message_index,
                count: pending.len(),
            });
        }
        Some(AssistantTurn {
            message_index,
            content,
            pending,
        })
    }

    pub fn accept(&mut self, id: SuggestionId) -> Result<AcceptOutcome, CurationError> {
        let (_, suggestion) = self
            .pending
            .take(id)
            .ok_or(CurationError::UnknownSuggestion(id))?;
        let applied = self.apply_to_curated(&suggestion);
        info!("Accepted \"{}\" in session {} (applied: {applied})", suggestion.label(), self.id);
        self.touch(SessionEvent::SuggestionAccepted { id, applied });
        Ok(AcceptOutcome {
            id,
            suggestion,
            applied,
        })
    }

    pub fn reject(&mut self, id: SuggestionId) -> Result<Suggestion, CurationError> {
        let (_, suggestion) = self
            .pending
            .take(id)
            .ok_or(CurationError::UnknownSuggestion(id))?;
        debug!("Rejected \"{}\" in session {}", suggestion.label(), self.id);
        self.touch(SessionEvent::SuggestionRejected { id });
        Ok(suggestion)
    }

    /// Applies every pending suggestion in message order through the same
    /// path as `accept`, then leaves nothing pending.
    pub fn apply_all(&mut self) -> ApplyAllReport {
        let mut report = ApplyAllReport::default();
        for PendingSuggestion { id, suggestion } in self.pending.drain() {
            if self.apply_to_curated(&suggestion) {
                report.applied.push(id);
            } else {
                report.missed.push(id);
            }
        }
        info!(
            "Applied {} of {} pending suggestions in session {}",
            report.applied.len(),
            report.applied.len() + report.missed.len(),
            self.id
        );
        self.touch(SessionEvent::AppliedAll {
            applied: report.applied.len(),
            missed: report.missed.len(),
        });
        report
    }

    /// Drops the curated copy; the canonical résumé is untouched.
    pub fn discard_curated(&mut self) {
        self.curated = None;
        self.touch(SessionEvent::CuratedDiscarded);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            user_id: self.user_id,
            mode: self.mode,
            resume: self.resume.clone(),
            curated: self.curated.clone(),
            transcript: self.transcript.clone(),
            pending: self
                .pending
                .grouped()
                .iter()
                .map(|(message_index, suggestions)| PendingGroup {
                    message_index: *message_index,
                    suggestions: suggestions.clone(),
                })
                .collect(),
            updated_at: self.updated_at,
        }
    }

    pub(crate) fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Each suggestion reaches here at most once: callers take it out of the
    /// pending set first.
    fn apply_to_curated(&mut self, suggestion: &Suggestion) -> bool {
        let curated = self.curated.get_or_insert_with(|| self.resume.clone());
        reconcile::apply(curated, suggestion)
    }

    fn touch(&mut self, event: SessionEvent) {
        self.updated_at = Utc::now();
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{Experience, Skill};
    use crate::models::suggestion::{SuggestionAction, SuggestionKind};

    fn resume() -> ResumeDocument {
        ResumeDocument {
            summary: Some("Original summary.".to_string()),
            skills: vec![Skill::named("Rust")],
            experience: vec![Experience {
                title: "Engineer".to_string(),
                company: "Acme".to_string(),
                responsibilities: Some(vec![
                    "Built X using Y".to_string(),
                    "Led Z".to_string(),
                ]),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn add_skill(name: &str) -> Suggestion {
        Suggestion::new(SuggestionKind::Skill, SuggestionAction::Add, name, name)
    }

    fn session_with_reply(suggestions: Vec<Suggestion>) -> (CurationSession, AssistantTurn) {
        let mut session = CurationSession::new(Uuid::new_v4(), resume());
        session.select_mode(ChatMode::JobMatch);
        let prepared = session.prepare_chat("Tailor it").unwrap();
        let turn = session
            .record_reply(prepared.epoch, "Here you go".to_string(), suggestions)
            .unwrap();
        (session, turn)
    }

    #[test]
    fn test_chat_requires_mode() {
        let mut session = CurationSession::new(Uuid::new_v4(), resume());
        assert!(matches!(
            session.prepare_chat("hi"),
            Err(CurationError::NoModeSelected)
        ));
    }

    #[test]
    fn test_chat_rejects_blank_message() {
        let mut session = CurationSession::new(Uuid::new_v4(), resume());
        session.select_mode(ChatMode::CareerGrowth);
        assert!(matches!(
            session.prepare_chat("   "),
            Err(CurationError::EmptyMessage)
        ));
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn test_history_excludes_message_being_sent() {
        let (mut session, _) = session_with_reply(vec![]);
        let prepared = session.prepare_chat("And the summary?").unwrap();
        assert_eq!(prepared.history.len(), 2);
        assert_eq!(prepared.history[0].content, "Tailor it");
        assert_eq!(prepared.history[1].role, ChatRole::Assistant);
        assert_eq!(session.transcript().len(), 3);
    }

    #[test]
    fn test_reply_suggestions_grouped_by_message_index() {
        let (session, turn) = session_with_reply(vec![add_skill("Docker"), add_skill("Go")]);
        assert_eq!(turn.message_index, 1);
        assert_eq!(session.pending().for_message(1).unwrap().len(), 2);
    }

    #[test]
    fn test_stale_reply_is_dropped_after_mode_change() {
        let mut session = CurationSession::new(Uuid::new_v4(), resume());
        session.select_mode(ChatMode::JobMatch);
        let prepared = session.prepare_chat("Tailor it").unwrap();
        session.select_mode(ChatMode::CareerGrowth);
        assert!(session
            .record_reply(prepared.epoch, "late".to_string(), vec![add_skill("Go")])
            .is_none());
        assert!(session.transcript().is_empty());
        assert!(session.pending().is_empty());
    }

    #[test]
    fn test_reject_never_mutates_documents() {
        let (mut session, turn) = session_with_reply(vec![add_skill("Docker")]);
        let rejected = session.reject(turn.pending[0].id).unwrap();
        assert_eq!(rejected.new_text, "Docker");
        assert!(session.curated().is_none());
        assert_eq!(session.resume(), &resume());
        assert!(session.pending().is_empty());
    }

    #[test]
    fn test_accept_applies_to_lazily_created_curated_copy() {
        let (mut session, turn) = session_with_reply(vec![add_skill("Docker")]);
        assert!(session.curated().is_none());

        let outcome = session.accept(turn.pending[0].id).unwrap();
        assert!(outcome.applied);

        let curated = session.curated().unwrap();
        assert!(curated.has_skill("docker"));
        assert!(!session.resume().has_skill("docker"));
        assert_eq!(session.display_document(), curated);
    }

    #[test]
    fn test_accept_miss_reports_not_applied() {
        let (mut session, turn) = session_with_reply(vec![add_skill("rust")]);
        let outcome = session.accept(turn.pending[0].id).unwrap();
        assert!(!outcome.applied);
        assert_eq!(session.curated().unwrap(), &resume());
    }

    #[test]
    fn test_pending_bookkeeping_across_accept_and_reject() {
        let (mut session, first) = session_with_reply(vec![add_skill("Docker"), add_skill("Go")]);
        let prepared = session.prepare_chat("More?").unwrap();
        let second = session
            .record_reply(prepared.epoch, "Also".to_string(), vec![add_skill("Kotlin")])
            .unwrap();
        assert_eq!(second.message_index, 3);
        assert_eq!(session.pending().len(), 3);

        session.accept(first.pending[0].id).unwrap();
        assert_eq!(session.pending().for_message(1).unwrap().len(), 1);

        session.reject(first.pending[1].id).unwrap();
        assert!(session.pending().for_message(1).is_none());
        assert_eq!(session.pending().for_message(3).unwrap().len(), 1);

        // already handled
        assert!(matches!(
            session.accept(first.pending[0].id),
            Err(CurationError::UnknownSuggestion(_))
        ));
        assert!(matches!(
            session.reject(first.pending[1].id),
            Err(CurationError::UnknownSuggestion(_))
        ));

        session.accept(second.pending[0].id).unwrap();
        assert!(session.pending().is_empty());

        let curated = session.curated().unwrap();
        assert!(curated.has_skill("Docker"));
        assert!(!curated.has_skill("Go"));
        assert!(curated.has_skill("Kotlin"));
    }

    #[test]
    fn test_apply_all_uses_same_path_and_clears_pending() {
        let summary = Suggestion::new(
            SuggestionKind::Summary,
            SuggestionAction::Update,
            "",
            "New summary.",
        );
        let experience = Suggestion::new(
            SuggestionKind::Experience,
            SuggestionAction::Modify,
            "Built X using Y",
            "Built X and W using Y",
        );
        let miss = Suggestion::new(
            SuggestionKind::Experience,
            SuggestionAction::Modify,
            "Negotiated vendor contracts",
            "Negotiated deals",
        );
        let (mut session, turn) =
            session_with_reply(vec![add_skill("Docker"), summary, experience, miss]);

        session.reject(turn.pending[0].id).unwrap();
        let report = session.apply_all();

        assert_eq!(report.applied, vec![turn.pending[1].id, turn.pending[2].id]);
        assert_eq!(report.missed, vec![turn.pending[3].id]);
        assert!(session.pending().is_empty());

        let curated = session.curated().unwrap();
        assert!(!curated.has_skill("Docker"));
        assert_eq!(curated.summary.as_deref(), Some("New summary."));
        assert_eq!(
            curated.experience[0].responsibilities.as_deref().unwrap(),
            ["Built X and W using Y", "Led Z"]
        );
    }

    #[test]
    fn test_accepted_suggestion_is_not_reapplied_by_apply_all() {
        let append = Suggestion::new(
            SuggestionKind::Experience,
            SuggestionAction::Modify,
            "Led Z",
            "Led Z and Q",
        );
        let (mut session, turn) = session_with_reply(vec![append, add_skill("Docker")]);
        assert!(session.accept(turn.pending[0].id).unwrap().applied);

        let report = session.apply_all();
        assert_eq!(report.applied, vec![turn.pending[1].id]);
        assert!(report.missed.is_empty());
        assert_eq!(
            session.curated().unwrap().experience[0]
                .responsibilities
                .as_deref()
                .unwrap(),
            ["Built X using Y", "Led Z and Q"]
        );
    }

    #[test]
    fn test_apply_all_with_nothing_pending() {
        let (mut session, _) = session_with_reply(vec![]);
        let report = session.apply_all();
        assert!(report.applied.is_empty());
        assert!(report.missed.is_empty());
        assert!(session.curated().is_none());
    }

    #[test]
    fn test_discard_curated_restores_canonical_view() {
        let (mut session, turn) = session_with_reply(vec![add_skill("Docker")]);
        session.accept(turn.pending[0].id).unwrap();
        session.discard_curated();
        assert!(session.curated().is_none());
        assert_eq!(session.display_document(), &resume());
    }

    #[test]
    fn test_events_are_recorded_and_drained() {
        let (mut session, turn) = session_with_reply(vec![add_skill("Docker")]);
        session.accept(turn.pending[0].id).unwrap();
        let events = session.take_events();
        assert_eq!(events.first(), Some(&SessionEvent::Opened));
        assert!(events.contains(&SessionEvent::SuggestionsProposed {
            message_index: 1,
            count: 1
        }));
        assert_eq!(
            events.last(),
            Some(&SessionEvent::SuggestionAccepted {
                id: turn.pending[0].id,
                applied: true
            })
        );
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn test_merge_extracted_updates_canonical_only() {
        let mut session = CurationSession::new(Uuid::new_v4(), resume());
        let extracted: ExtractedResume =
            serde_json::from_str(r#"{"fullName": "Grace Hopper"}"#).unwrap();
        session.merge_extracted(extracted);
        assert_eq!(session.resume().personal_info.full_name, "Grace Hopper");
        assert!(session.curated().is_none());
    }
}
