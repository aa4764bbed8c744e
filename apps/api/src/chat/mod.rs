//! Conversation service client.
//!
//! All chat traffic goes through `ConversationService`; the HTTP
//! implementation talks to the chatbot's `/chat` endpoint. Failures are turned
//! into `ChatError`s whose `Display` text is meant to be shown to the user.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

pub mod extract;

const ERROR_SNIPPET_LEN: usize = 100;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("The AI service is busy. Please wait a few seconds and try again.")]
    Busy,

    #[error("{0}")]
    Service(String),

    #[error("Server error ({status}): {snippet}")]
    Server { status: u16, snippet: String },

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChatMode {
    CareerGrowth,
    JobMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of the conversation as the service sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub mode: ChatMode,
    pub user_id: Uuid,
    pub conversation_history: Vec<ChatTurn>,
}

/// Raw reply. `suggestions` is kept untyped so a malformed entry degrades to
/// the text fallback instead of failing the whole reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub suggestions: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: Option<String>,
}

#[async_trait]
pub trait ConversationService: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError>;
}

#[derive(Clone)]
pub struct HttpConversationClient {
    client: Client,
    base_url: String,
}

impl HttpConversationClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ChatError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ConversationService for HttpConversationClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        debug!(
            "Sending chat request: mode={:?} user={} message_len={}",
            request.mode,
            request.user_id,
            request.message.len()
        );

        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Chat API returned {status}: {body}");
            return Err(classify_failure(status.as_u16(), &body));
        }

        let reply: ChatResponse = response.json().await?;
        debug!("Chat response received, length: {}", reply.message.len());
        Ok(reply)
    }
}

/// Maps a non-success status and body to the error shown to the user.
pub fn classify_failure(status: u16, body: &str) -> ChatError {
    if status == 429 {
        return ChatError::Busy;
    }
    match serde_json::from_str::<ServiceErrorBody>(body) {
        Ok(parsed) => ChatError::Service(
            parsed
                .error
                .unwrap_or_else(|| "Failed to get response from chatbot".to_string()),
        ),
        Err(_) => ChatError::Server {
            status,
            snippet: body.chars().take(ERROR_SNIPPET_LEN).collect(),
        },
    }
}
