mod chat;
mod config;
mod curation;
mod db;
mod errors;
mod models;
mod parser_client;
mod reconcile;
mod render;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chat::HttpConversationClient;
use crate::config::Config;
use crate::curation::registry::SessionRegistry;
use crate::db::create_pool;
use crate::parser_client::HttpDocumentParser;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryResumeStore, PgResumeStore, ResumeStore};

const IDLE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Curator API v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn ResumeStore> = match config.database_url.as_deref() {
        Some(url) => Arc::new(PgResumeStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL not set; saved resumes are kept in memory only");
            Arc::new(MemoryResumeStore::new())
        }
    };

    let timeout = Duration::from_secs(config.upstream_timeout_secs);
    let chat = HttpConversationClient::new(config.chatbot_url.clone(), timeout)?;
    info!("Conversation service at {}", config.chatbot_url);
    let parser = HttpDocumentParser::new(
        config.parser_url.clone(),
        config.linkedin_parser_url.clone(),
        timeout,
    )?;
    info!(
        "Document parser at {} (LinkedIn exports via {})",
        config.parser_url, config.linkedin_parser_url
    );

    let sessions = SessionRegistry::new();
    spawn_event_logger(&sessions);
    spawn_idle_sweeper(
        &sessions,
        chrono::Duration::from_std(Duration::from_secs(config.session_idle_ttl_secs))?,
    );

    let state = AppState {
        sessions,
        store,
        chat: Arc::new(chat),
        parser: Arc::new(parser),
        config: config.clone(),
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict origins once the web client's host is fixed
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Logs every session event until the registry is dropped.
fn spawn_event_logger(sessions: &SessionRegistry) {
    let mut events = sessions.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(notification) => debug!(
                    "session {}: {:?}",
                    notification.session_id, notification.event
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Session event logger lagged, skipped {skipped} events")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Periodically evicts sessions idle for longer than `ttl`.
fn spawn_idle_sweeper(sessions: &SessionRegistry, ttl: chrono::Duration) {
    let sessions = sessions.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(IDLE_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let evicted = sessions.evict_idle(chrono::Utc::now() - ttl).await;
            if evicted > 0 {
                info!("Evicted {evicted} idle session(s)");
            }
        }
    });
}
