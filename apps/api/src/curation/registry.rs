use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::curation::session::{CurationError, CurationSession, SessionEvent};
use crate::models::resume::ResumeDocument;

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
pub struct SessionNotification {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub event: SessionEvent,
}

/// In-memory owner of all curation sessions.
///
/// Every mutation goes through `update`, which drains the session's events
/// and broadcasts them. Callers must not hold the lock across network calls.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, CurationSession>>>,
    events: broadcast::Sender<SessionNotification>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotification> {
        self.events.subscribe()
    }

    /// Opens a session and returns its id.
    pub async fn open(&self, user_id: Uuid, resume: ResumeDocument) -> Uuid {
        let mut session = CurationSession::new(user_id, resume);
        let id = session.id();
        let events = session.take_events();
        self.sessions.write().await.insert(id, session);
        info!("Opened curation session {id} for user {user_id}");
        self.publish(id, events);
        id
    }

    pub async fn close(&self, id: Uuid) -> Result<(), CurationError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| info!("Closed curation session {id}"))
            .ok_or(CurationError::UnknownSession(id))
    }

    /// Runs `f` against a shared view of the session.
    pub async fn read<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&CurationSession) -> R,
    ) -> Result<R, CurationError> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(&id).ok_or(CurationError::UnknownSession(id))?;
        Ok(f(session))
    }

    /// Runs `f` against the session under the write lock, then broadcasts
    /// whatever events the mutation produced.
    pub async fn update<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut CurationSession) -> R,
    ) -> Result<R, CurationError> {
        let (result, events) = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(&id)
                .ok_or(CurationError::UnknownSession(id))?;
            let result = f(session);
            (result, session.take_events())
        };
        self.publish(id, events);
        Ok(result)
    }

    /// Drops every session that has not changed since `cutoff`.
    /// Returns how many were evicted.
    pub async fn evict_idle(&self, cutoff: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let keep = session.updated_at() >= cutoff;
            if !keep {
                info!("Evicting idle curation session {id}");
            }
            keep
        });
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn publish(&self, session_id: Uuid, events: Vec<SessionEvent>) {
        for event in events {
            // no subscribers is fine
            if self
                .events
                .send(SessionNotification { session_id, event })
                .is_err()
            {
                debug!("No subscribers for session {session_id} events");
            }
        }
    }
}
