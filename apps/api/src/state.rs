use std::sync::Arc;

use crate::chat::ConversationService;
use crate::config::Config;
use crate::curation::registry::SessionRegistry;
use crate::parser_client::DocumentParser;
use crate::store::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistry,
    /// Postgres or in-memory, chosen at startup from `DATABASE_URL`.
    pub store: Arc<dyn ResumeStore>,
    pub chat: Arc<dyn ConversationService>,
    pub parser: Arc<dyn DocumentParser>,
    pub config: Config,
}
